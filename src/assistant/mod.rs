pub mod interface;
pub mod openai_client;
pub mod poller;
pub mod types;

pub use interface::{AssistantBackend, AssistantError};
pub use openai_client::OpenAIAssistantClient;
pub use poller::{wait_for_run, PollError, PollSettings};
pub use types::{ListOrder, MessageContent, Run, RunStatus, Thread, ThreadMessage};
