pub mod contact_form;
pub mod counter;
pub mod mobile_menu;
pub mod notification;
pub mod scroll_effects;
pub mod validation;
