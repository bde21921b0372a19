use std::collections::HashMap;

use cucumber::World;
use log::*;
use tokio::time::sleep;
use troca_engine::{
    events::EventProducers,
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    ChatApi,
    NegotiationApi,
    SqliteDatabase,
    UserApi,
};

#[derive(Default, Debug, World)]
pub struct TrocaWorld {
    pub system: Option<MarketplaceSystem>,
}

#[derive(Debug)]
pub struct MarketplaceSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub users: UserApi<SqliteDatabase>,
    pub chats: ChatApi<SqliteDatabase>,
    pub negotiation: NegotiationApi<SqliteDatabase>,
    /// Name -> user id for the people registered in the scenario.
    pub user_ids: HashMap<String, i64>,
    /// Product name -> product id for the listings created in the scenario.
    pub product_ids: HashMap<String, i64>,
    pub chat_id: Option<i64>,
    /// Product the current chat is about.
    pub chat_product: Option<i64>,
    pub chat_created: Option<bool>,
    pub offer_id: Option<i64>,
    pub order_id: Option<i64>,
    /// Error message of the most recent failed call, if any. Steps that expect success clear it.
    pub last_error: Option<String>,
}

impl TrocaWorld {
    pub fn system(&self) -> &MarketplaceSystem {
        self.system.as_ref().expect("Marketplace system not initialised")
    }

    pub fn system_mut(&mut self) -> &mut MarketplaceSystem {
        self.system.as_mut().expect("Marketplace system not initialised")
    }
}

impl MarketplaceSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        sleep(std::time::Duration::from_millis(50)).await;
        let users = UserApi::new(db.clone());
        let chats = ChatApi::new(db.clone(), EventProducers::default());
        let negotiation = NegotiationApi::new(db.clone(), EventProducers::default());
        Self {
            db_path: url,
            db,
            users,
            chats,
            negotiation,
            user_ids: HashMap::new(),
            product_ids: HashMap::new(),
            chat_id: None,
            chat_product: None,
            chat_created: None,
            offer_id: None,
            order_id: None,
            last_error: None,
        }
    }

    pub fn user(&self, name: &str) -> i64 {
        *self.user_ids.get(name).unwrap_or_else(|| panic!("No user named {name} in this scenario"))
    }

    pub fn product(&self, name: &str) -> i64 {
        *self.product_ids.get(name).unwrap_or_else(|| panic!("No product named {name} in this scenario"))
    }

    pub fn chat_id(&self) -> i64 {
        self.chat_id.expect("No chat has been opened in this scenario")
    }

    pub fn chat_product(&self) -> i64 {
        self.chat_product.expect("No chat has been opened in this scenario")
    }

    pub fn offer_id(&self) -> i64 {
        self.offer_id.expect("No offer has been made in this scenario")
    }

    pub fn order_id(&self) -> i64 {
        self.order_id.expect("No order has been created in this scenario")
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
