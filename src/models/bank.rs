use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u32,
    pub username: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub role: Role,
    #[serde(skip)]
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Checking,
    Savings,
    Business,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: u32,
    pub number: String,
    #[serde(rename = "ownerId")]
    pub owner_id: u32,
    pub kind: AccountKind,
    pub currency: String,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Credit,
    Debit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    #[serde(rename = "accountId")]
    pub account_id: u32,
    pub date: DateTime<Utc>,
    pub kind: TransactionKind,
    pub description: String,
    pub amount: Decimal,
    #[serde(rename = "balanceAfter")]
    pub balance_after: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    #[serde(rename = "fromAccountId")]
    pub from_account_id: u32,
    #[serde(rename = "toAccountId")]
    pub to_account_id: u32,
    pub amount: Decimal,
    #[serde(default)]
    pub narrative: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub reference: String,
    #[serde(rename = "fromAccountId")]
    pub from_account_id: u32,
    #[serde(rename = "toAccountId")]
    pub to_account_id: u32,
    pub amount: Decimal,
    pub currency: String,
    #[serde(rename = "balanceBefore")]
    pub balance_before: Decimal,
    #[serde(rename = "balanceAfter")]
    pub balance_after: Decimal,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientDashboard {
    pub user: User,
    pub accounts: Vec<Account>,
    #[serde(rename = "totalBalance")]
    pub total_balance: BTreeMap<String, Decimal>,
    #[serde(rename = "recentTransactions")]
    pub recent_transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminDashboard {
    #[serde(rename = "userCount")]
    pub user_count: usize,
    #[serde(rename = "accountCount")]
    pub account_count: usize,
    #[serde(rename = "transactionCount")]
    pub transaction_count: usize,
    #[serde(rename = "totalDeposits")]
    pub total_deposits: BTreeMap<String, Decimal>,
    #[serde(rename = "recentTransactions")]
    pub recent_transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionQuery {
    pub account: Option<u32>,
    pub limit: Option<usize>,
}

/// Identity attached to a request once its bearer token is recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: u32,
    pub role: Role,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
