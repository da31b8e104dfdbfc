pub mod engine;
pub mod sender;
pub mod slack;
pub mod template;
pub mod throttle;
pub mod webhook;

pub use engine::NotificationEngine;
pub use sender::{ChannelSender, Dispatcher, LogSender};
pub use slack::SlackSender;
pub use template::{default_message, render_template};
pub use throttle::{ThrottleDecision, ThrottleState};
pub use webhook::WebhookSender;
