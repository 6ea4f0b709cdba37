mod blood_group;
mod donation;
mod payment;
mod role;

pub use blood_group::BloodGroup;
pub use donation::DonationStatus;
pub use payment::{major_to_minor, minor_to_major, Payment};
pub use role::{Role, UserStatus};
