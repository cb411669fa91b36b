pub mod artist;
pub mod collectable;
pub mod group;
pub mod image;
pub mod label;
pub mod role;
pub mod user;

pub use artist::{Artist, ArtistWithImages};
pub use collectable::Collectable;
pub use group::{Group, GroupMemberWithArtist, GroupWithImages};
pub use image::Image;
pub use label::{Label, LabelWithImages};
pub use role::{Role, RoleRecord};
pub use user::{CollectorProfile, User};
