// dotpush state managers
// Managers own long-lived state: the background device-flow poller.

pub mod background_poller;
