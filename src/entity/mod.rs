pub mod audit_logs;
pub mod categories;
pub mod detail_images;
pub mod details;
pub mod images;
pub mod item_categories;
pub mod items;
pub mod sizes;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use categories::Entity as Categories;
pub use detail_images::Entity as DetailImages;
pub use details::Entity as Details;
pub use images::Entity as Images;
pub use item_categories::Entity as ItemCategories;
pub use items::Entity as Items;
pub use sizes::Entity as Sizes;
pub use users::Entity as Users;
