pub mod confirmation_email;
pub mod migrate_images;
pub mod summarize;
