pub mod event_dto;
pub mod notification_dto;
