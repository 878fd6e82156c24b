use std::collections::BTreeMap;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::error::BankError;
use crate::models::bank::{
    Account, AccountKind, AdminDashboard, Caller, ClientDashboard, Role, Transaction,
    TransactionKind, TransactionQuery, TransferReceipt, TransferRequest, User,
};

pub const CLIENT_USER_ID: u32 = 1;
pub const ADMIN_USER_ID: u32 = 2;
const SEED_HISTORY_DAYS: i64 = 90;
const SEED_TRANSACTIONS_PER_ACCOUNT: usize = 8;
const DEFAULT_LIMIT: usize = 50;
const RECENT_LIMIT: usize = 5;

const SEED_DESCRIPTIONS: [&str; 6] = [
    "Card payment",
    "Salary",
    "Wire transfer",
    "Utility bill",
    "ATM withdrawal",
    "Interest",
];

#[derive(Debug, Clone)]
pub struct BankData {
    pub users: Vec<User>,
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
    next_transaction_id: u64,
}

impl BankData {
    /// Demo customers and accounts with randomly dated history.
    pub fn seed<R: Rng>(demo_password: &str, now: DateTime<Utc>, rng: &mut R) -> Self {
        let users = vec![
            User {
                id: CLIENT_USER_ID,
                username: "client".to_string(),
                full_name: "Alex Morgan".to_string(),
                role: Role::Client,
                password: demo_password.to_string(),
            },
            User {
                id: ADMIN_USER_ID,
                username: "admin".to_string(),
                full_name: "Operations Desk".to_string(),
                role: Role::Admin,
                password: demo_password.to_string(),
            },
            // Business customer without online access
            User {
                id: 3,
                username: "northwind".to_string(),
                full_name: "Northwind Holdings".to_string(),
                role: Role::Client,
                password: String::new(),
            },
        ];
        let accounts = vec![
            account(1, "4400-0001", CLIENT_USER_ID, AccountKind::Checking, "USD", 2_534_012),
            account(2, "4400-0002", CLIENT_USER_ID, AccountKind::Savings, "USD", 12_000_000),
            account(3, "4400-0003", 3, AccountKind::Business, "USD", 145_000_000),
            account(4, "4400-0004", CLIENT_USER_ID, AccountKind::Savings, "EUR", 800_000),
        ];

        let mut data = Self {
            users,
            accounts,
            transactions: Vec::new(),
            next_transaction_id: 1,
        };
        let account_snapshot = data.accounts.clone();
        for acc in &account_snapshot {
            data.seed_history(acc, now, rng);
        }
        data.transactions
            .sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        data
    }

    fn seed_history<R: Rng>(&mut self, acc: &Account, now: DateTime<Utc>, rng: &mut R) {
        let mut entries: Vec<(DateTime<Utc>, TransactionKind, Decimal, &str)> = (0
            ..SEED_TRANSACTIONS_PER_ACCOUNT)
            .map(|_| {
                let age = Duration::minutes(rng.gen_range(0..SEED_HISTORY_DAYS * 24 * 60));
                let kind = if rng.gen_bool(0.5) {
                    TransactionKind::Credit
                } else {
                    TransactionKind::Debit
                };
                let amount = Decimal::new(rng.gen_range(500..500_000), 2);
                let description = SEED_DESCRIPTIONS[rng.gen_range(0..SEED_DESCRIPTIONS.len())];
                (now - age, kind, amount, description)
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        // Walk backwards from the current balance so the history ends on it.
        let net: Decimal = entries.iter().map(|(_, kind, amount, _)| signed(*kind, *amount)).sum();
        let mut balance = acc.balance - net;
        for (date, kind, amount, description) in entries {
            balance += signed(kind, amount);
            let id = self.next_id();
            self.transactions.push(Transaction {
                id,
                account_id: acc.id,
                date,
                kind,
                description: description.to_string(),
                amount,
                balance_after: balance,
            });
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_transaction_id;
        self.next_transaction_id += 1;
        id
    }

    pub fn authenticate(&self, username: &str, password: &str) -> Option<User> {
        if password.is_empty() {
            return None;
        }
        self.users
            .iter()
            .find(|u| u.username == username && u.password == password)
            .cloned()
    }

    pub fn user(&self, id: u32) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn accounts_for(&self, caller: Caller) -> Vec<Account> {
        self.accounts
            .iter()
            .filter(|a| caller.is_admin() || a.owner_id == caller.user_id)
            .cloned()
            .collect()
    }

    pub fn account(&self, caller: Caller, id: u32) -> Result<&Account, BankError> {
        let acc = self
            .accounts
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| BankError::NotFound(format!("Account {}", id)))?;
        if !caller.is_admin() && acc.owner_id != caller.user_id {
            return Err(BankError::Forbidden);
        }
        Ok(acc)
    }

    pub fn transactions(
        &self,
        caller: Caller,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, BankError> {
        let visible: Vec<u32> = match query.account {
            Some(id) => vec![self.account(caller, id)?.id],
            None => self.accounts_for(caller).iter().map(|a| a.id).collect(),
        };
        Ok(self
            .transactions
            .iter()
            .filter(|t| visible.contains(&t.account_id))
            .take(query.limit.unwrap_or(DEFAULT_LIMIT))
            .cloned()
            .collect())
    }

    pub fn transfer<R: Rng>(
        &mut self,
        caller: Caller,
        request: &TransferRequest,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<TransferReceipt, BankError> {
        if request.amount <= Decimal::ZERO {
            return Err(BankError::Rejected("Amount must be positive".to_string()));
        }
        if request.from_account_id == request.to_account_id {
            return Err(BankError::Rejected(
                "Source and destination accounts must differ".to_string(),
            ));
        }
        let from = self.account(caller, request.from_account_id)?.clone();
        let to = self
            .accounts
            .iter()
            .find(|a| a.id == request.to_account_id)
            .cloned()
            .ok_or_else(|| BankError::NotFound(format!("Account {}", request.to_account_id)))?;
        if from.currency != to.currency {
            return Err(BankError::Rejected(format!(
                "Currency mismatch: {} to {}",
                from.currency, to.currency
            )));
        }
        if from.balance < request.amount {
            return Err(BankError::Rejected("Insufficient funds".to_string()));
        }

        let reference = format!("TRF-{}", URL_SAFE_NO_PAD.encode(rng.gen::<[u8; 9]>()));
        let narrative = if request.narrative.trim().is_empty() {
            format!("Transfer {}", reference)
        } else {
            request.narrative.trim().to_string()
        };

        let from_after = from.balance - request.amount;
        let to_after = to.balance + request.amount;
        for acc in self.accounts.iter_mut() {
            if acc.id == from.id {
                acc.balance = from_after;
            } else if acc.id == to.id {
                acc.balance = to_after;
            }
        }

        let debit_id = self.next_id();
        let credit_id = self.next_id();
        let debit = Transaction {
            id: debit_id,
            account_id: from.id,
            date: now,
            kind: TransactionKind::Debit,
            description: narrative.clone(),
            amount: request.amount,
            balance_after: from_after,
        };
        let credit = Transaction {
            id: credit_id,
            account_id: to.id,
            date: now,
            kind: TransactionKind::Credit,
            description: narrative,
            amount: request.amount,
            balance_after: to_after,
        };
        // newest first
        self.transactions.insert(0, credit);
        self.transactions.insert(0, debit);

        Ok(TransferReceipt {
            reference,
            from_account_id: from.id,
            to_account_id: to.id,
            amount: request.amount,
            currency: from.currency,
            balance_before: from.balance,
            balance_after: from_after,
            date: now,
        })
    }

    pub fn client_dashboard(&self, caller: Caller) -> Result<ClientDashboard, BankError> {
        let user = self
            .user(caller.user_id)
            .cloned()
            .ok_or_else(|| BankError::NotFound(format!("User {}", caller.user_id)))?;
        let accounts = self.accounts_for(caller);
        let recent_transactions = self.transactions(
            caller,
            &TransactionQuery {
                account: None,
                limit: Some(RECENT_LIMIT),
            },
        )?;
        Ok(ClientDashboard {
            user,
            total_balance: totals_by_currency(&accounts),
            accounts,
            recent_transactions,
        })
    }

    pub fn admin_dashboard(&self) -> AdminDashboard {
        AdminDashboard {
            user_count: self.users.len(),
            account_count: self.accounts.len(),
            transaction_count: self.transactions.len(),
            total_deposits: totals_by_currency(&self.accounts),
            recent_transactions: self.transactions.iter().take(RECENT_LIMIT).cloned().collect(),
        }
    }
}

fn account(
    id: u32,
    number: &str,
    owner_id: u32,
    kind: AccountKind,
    currency: &str,
    balance_cents: i64,
) -> Account {
    Account {
        id,
        number: number.to_string(),
        owner_id,
        kind,
        currency: currency.to_string(),
        balance: Decimal::new(balance_cents, 2),
    }
}

fn signed(kind: TransactionKind, amount: Decimal) -> Decimal {
    match kind {
        TransactionKind::Credit => amount,
        TransactionKind::Debit => -amount,
    }
}

fn totals_by_currency(accounts: &[Account]) -> BTreeMap<String, Decimal> {
    let mut totals = BTreeMap::new();
    for acc in accounts {
        *totals.entry(acc.currency.clone()).or_insert(Decimal::ZERO) += acc.balance;
    }
    totals
}

/// Shared handle over the in-memory store used by the mock API.
#[derive(Clone)]
pub struct BankRepository {
    data: Arc<RwLock<BankData>>,
}

impl BankRepository {
    pub fn new(data: BankData) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
        }
    }

    pub fn seeded(demo_password: &str) -> Self {
        Self::new(BankData::seed(demo_password, Utc::now(), &mut rand::thread_rng()))
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Option<User> {
        self.data.read().await.authenticate(username, password)
    }

    pub async fn accounts(&self, caller: Caller) -> Vec<Account> {
        self.data.read().await.accounts_for(caller)
    }

    pub async fn account(&self, caller: Caller, id: u32) -> Result<Account, BankError> {
        self.data.read().await.account(caller, id).cloned()
    }

    pub async fn transactions(
        &self,
        caller: Caller,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, BankError> {
        self.data.read().await.transactions(caller, query)
    }

    pub async fn transfer(
        &self,
        caller: Caller,
        request: &TransferRequest,
    ) -> Result<TransferReceipt, BankError> {
        let mut data = self.data.write().await;
        data.transfer(caller, request, Utc::now(), &mut rand::thread_rng())
    }

    pub async fn client_dashboard(&self, caller: Caller) -> Result<ClientDashboard, BankError> {
        self.data.read().await.client_dashboard(caller)
    }

    pub async fn admin_dashboard(&self) -> AdminDashboard {
        self.data.read().await.admin_dashboard()
    }
}
