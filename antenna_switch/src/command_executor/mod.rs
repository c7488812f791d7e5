pub mod switchboard;
