pub mod like_client;
