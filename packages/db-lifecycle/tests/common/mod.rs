#![allow(dead_code)]

use parking_lot::Mutex;

use db_lifecycle::{DbLogger, ShutdownAction, ShutdownRegistry, SignalRegistry};

/// Logger fake capturing every entry for assertions.
#[derive(Default)]
pub struct RecordingLogger {
    entries: Mutex<Vec<(&'static str, String, String)>>,
}

impl RecordingLogger {
    pub fn messages(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .map(|(_, message, _)| message.clone())
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|(level, _, _)| *level == "error")
            .map(|(_, message, _)| message.clone())
            .collect()
    }
}

impl DbLogger for RecordingLogger {
    fn info(&self, message: &str, data: &str) {
        self.entries
            .lock()
            .push(("info", message.to_string(), data.to_string()));
    }

    fn error(&self, message: &str, data: &str) {
        self.entries
            .lock()
            .push(("error", message.to_string(), data.to_string()));
    }
}

/// Registry fake recording names while delegating storage to a real
/// drain-once registry.
#[derive(Default)]
pub struct RecordingRegistry {
    pub inner: SignalRegistry,
    names: Mutex<Vec<String>>,
}

impl RecordingRegistry {
    pub fn names(&self) -> Vec<String> {
        self.names.lock().clone()
    }

    pub async fn run(&self) {
        self.inner.run().await;
    }
}

impl ShutdownRegistry for RecordingRegistry {
    fn register(&self, name: &str, action: ShutdownAction) {
        self.names.lock().push(name.to_string());
        self.inner.register(name, action);
    }
}

pub mod entities {
    pub mod author {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
        #[sea_orm(table_name = "authors")]
        pub struct Model {
            #[sea_orm(primary_key)]
            pub id: i32,
            pub name: String,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {
            #[sea_orm(has_many = "super::book::Entity")]
            Book,
        }

        impl Related<super::book::Entity> for Entity {
            fn to() -> RelationDef {
                Relation::Book.def()
            }
        }

        impl ActiveModelBehavior for ActiveModel {}
    }

    pub mod book {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
        #[sea_orm(table_name = "books")]
        pub struct Model {
            #[sea_orm(primary_key)]
            pub id: i32,
            pub author_id: i32,
            pub title: String,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {
            #[sea_orm(
                belongs_to = "super::author::Entity",
                from = "Column::AuthorId",
                to = "super::author::Column::Id"
            )]
            Author,
        }

        impl Related<super::author::Entity> for Entity {
            fn to() -> RelationDef {
                Relation::Author.def()
            }
        }

        impl ActiveModelBehavior for ActiveModel {}
    }
}
