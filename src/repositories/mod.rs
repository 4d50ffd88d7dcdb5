pub mod announcements;
pub mod ids;
pub mod repository;
pub mod settings;
pub mod store_repository;
pub mod user;

pub use announcements::AnnouncementRepository;
pub use ids::IdGenerator;
pub use repository::EntityRepository;
pub use settings::SettingsRepository;
pub use store_repository::StoreRepository;
pub use user::UserDataRepository;
