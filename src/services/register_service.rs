use std::sync::Arc;
use crate::config::ServeArgs;
use crate::models::bank::{Caller, Role};
use crate::repositories::bank_repository::{BankRepository, ADMIN_USER_ID, CLIENT_USER_ID};

/// Bearer tokens the mock API recognises, one per role.
#[derive(Clone)]
pub struct Tokens {
    pub client: String,
    pub admin: String,
}

impl Tokens {
    pub fn caller_for(&self, token: &str) -> Option<Caller> {
        if token == self.admin {
            Some(Caller { user_id: ADMIN_USER_ID, role: Role::Admin })
        } else if token == self.client {
            Some(Caller { user_id: CLIENT_USER_ID, role: Role::Client })
        } else {
            None
        }
    }

    pub fn token_for(&self, role: Role) -> &str {
        match role {
            Role::Admin => &self.admin,
            Role::Client => &self.client,
        }
    }
}

#[derive(Clone)]
pub struct ServiceRegister {
    pub bank_repository: BankRepository,
    pub tokens: Arc<Tokens>,
}

impl ServiceRegister {
    pub fn new(
        args: &ServeArgs,
        bank_repository: BankRepository,
    ) -> Self {
        Self {
            bank_repository,
            tokens: Arc::new(Tokens {
                client: args.client_token.clone(),
                admin: args.admin_token.clone(),
            }),
        }
    }
}
