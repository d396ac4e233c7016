//! SeaORM entities of the finance backend.
//!
//! Ownership runs user -> category -> transaction -> recurring configuration,
//! user -> debt -> amortization and user -> device -> notification preference.

pub mod amortization;
pub mod category;
pub mod debt;
pub mod device;
pub mod notice_log;
pub mod notification;
pub mod notification_preference;
pub mod recurring_transaction;
pub mod transaction;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::amortization::Entity as Amortization;
    pub use super::category::Entity as Category;
    pub use super::debt::Entity as Debt;
    pub use super::device::Entity as Device;
    pub use super::notice_log::Entity as NoticeLog;
    pub use super::notification::Entity as Notification;
    pub use super::notification_preference::Entity as NotificationPreference;
    pub use super::recurring_transaction::Entity as RecurringTransaction;
    pub use super::transaction::Entity as Transaction;
    pub use super::user::Entity as User;
}
