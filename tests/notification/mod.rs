mod notify_flow;
mod settings;
