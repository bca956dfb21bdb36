//! SeaORM entities mapping the DevSearch tables.

pub mod message;
pub mod profile;
pub mod project;
pub mod project_tag;
pub mod review;
pub mod skill;
pub mod tag;
pub mod user;

pub mod prelude {
    pub use super::user::Entity as User;
    pub use super::user::Model as UserModel;
    pub use super::user::ActiveModel as UserActiveModel;
    pub use super::user::Column as UserColumn;

    pub use super::profile::Entity as Profile;
    pub use super::profile::Model as ProfileModel;
    pub use super::profile::ActiveModel as ProfileActiveModel;
    pub use super::profile::Column as ProfileColumn;

    pub use super::skill::Entity as Skill;
    pub use super::skill::Model as SkillModel;
    pub use super::skill::ActiveModel as SkillActiveModel;
    pub use super::skill::Column as SkillColumn;

    pub use super::project::Entity as Project;
    pub use super::project::Model as ProjectModel;
    pub use super::project::ActiveModel as ProjectActiveModel;
    pub use super::project::Column as ProjectColumn;

    pub use super::tag::Entity as Tag;
    pub use super::tag::Model as TagModel;
    pub use super::tag::ActiveModel as TagActiveModel;
    pub use super::tag::Column as TagColumn;

    pub use super::project_tag::Entity as ProjectTag;
    pub use super::project_tag::Model as ProjectTagModel;
    pub use super::project_tag::ActiveModel as ProjectTagActiveModel;
    pub use super::project_tag::Column as ProjectTagColumn;

    pub use super::review::Entity as Review;
    pub use super::review::Model as ReviewModel;
    pub use super::review::ActiveModel as ReviewActiveModel;
    pub use super::review::Column as ReviewColumn;

    pub use super::message::Entity as Message;
    pub use super::message::Model as MessageModel;
    pub use super::message::ActiveModel as MessageActiveModel;
    pub use super::message::Column as MessageColumn;
}
