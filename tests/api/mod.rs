mod health_tests;
mod invite_tests;
mod message_tests;
mod server_tests;
mod social_tests;
mod user_tests;
mod voice_tests;
mod webhook_tests;
