pub mod campaigns;
pub mod contacts;

pub use campaigns::CampaignRepository;
pub use contacts::{read_customers_csv, ContactStore};
