pub mod config;

pub mod domain {
    pub mod collection;
    pub mod error;
    pub mod repository;

    pub mod model {
        pub mod book;
        pub mod category;
        pub mod id;
        pub mod resource;
    }
}

pub mod application {
    pub mod controller;
    pub mod error;
    pub mod notify;
    pub mod stats;
    pub mod view;
}

pub mod infra {
    pub mod http_client;
}

pub mod interface {
    pub mod mcp;
}
