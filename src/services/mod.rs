pub mod monitor_service;
pub mod register_service;
pub mod reservation_service;
pub mod telegram_service;
