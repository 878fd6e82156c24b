pub mod bank_repository;
pub mod ft_repository;
pub mod ledger;
pub mod redis_repository;
