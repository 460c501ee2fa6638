pub mod certificate_service;
pub mod event_dispatcher;
pub mod notifier_service;
