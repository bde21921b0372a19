use mockall::mock;
use troca_engine::{
    chat_objects::{ChatDetail, ChatSummary},
    db_types::{Category, Chat, Message, NewOffer, NewProduct, NewUser, Offer, Order, OrderStatus, Product, ProductImage, User},
    traits::{
        CatalogApiError,
        CatalogManagement,
        ChatApiError,
        ChatManagement,
        NegotiationDatabase,
        NegotiationError,
        UserApiError,
        UserManagement,
    },
};

mock! {
    pub UserManager {}
    impl UserManagement for UserManager {
        async fn create_user(&self, user: NewUser) -> Result<User, UserApiError>;
        async fn fetch_user_by_id(&self, id: i64) -> Result<Option<User>, UserApiError>;
        async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, UserApiError>;
        async fn set_stripe_customer_id(&self, user_id: i64, customer_id: &str) -> Result<User, UserApiError>;
    }
}

mock! {
    pub CatalogManager {}
    impl CatalogManagement for CatalogManager {
        async fn create_product(&self, product: NewProduct) -> Result<Product, CatalogApiError>;
        async fn fetch_product(&self, id: i64) -> Result<Option<Product>, CatalogApiError>;
        async fn fetch_product_images(&self, product_id: i64) -> Result<Vec<ProductImage>, CatalogApiError>;
        async fn fetch_categories(&self) -> Result<Vec<Category>, CatalogApiError>;
    }
}

mock! {
    pub ChatManager {}
    impl ChatManagement for ChatManager {
        async fn create_chat(&self, product_id: i64, requester: i64, seller: i64) -> Result<(Chat, bool), ChatApiError>;
        async fn fetch_chat_by_id(&self, chat_id: i64, user_id: i64) -> Result<Option<ChatDetail>, ChatApiError>;
        async fn fetch_chats_for_user(&self, user_id: i64, page: i64, limit: i64) -> Result<(Vec<ChatSummary>, i64), ChatApiError>;
        async fn send_message(&self, chat_id: i64, from_user_id: i64, text: &str) -> Result<Message, ChatApiError>;
        async fn fetch_messages(&self, chat_id: i64, user_id: i64) -> Result<Vec<Message>, ChatApiError>;
    }
}

mock! {
    pub NegotiationManager {}
    impl Clone for NegotiationManager {
        fn clone(&self) -> Self;
    }
    impl NegotiationDatabase for NegotiationManager {
        fn url(&self) -> &str;
        async fn insert_offer(&self, offer: NewOffer) -> Result<Offer, NegotiationError>;
        async fn accept_offer(&self, offer_id: i64, user_id: i64) -> Result<(Offer, Order), NegotiationError>;
        async fn decline_offer(&self, offer_id: i64, user_id: i64) -> Result<Offer, NegotiationError>;
        async fn offer_for_payment(&self, offer_id: i64, sender_id: i64) -> Result<Offer, NegotiationError>;
        async fn attach_payment_intent(&self, offer_id: i64, intent_id: &str) -> Result<Offer, NegotiationError>;
        async fn offer_awaiting_confirmation(&self, offer_id: i64) -> Result<Offer, NegotiationError>;
        async fn complete_payment(&self, offer_id: i64) -> Result<Offer, NegotiationError>;
        async fn offer_by_id(&self, offer_id: i64) -> Result<Option<Offer>, NegotiationError>;
        async fn pending_offer_for_chat(&self, chat_id: i64) -> Result<Option<Offer>, NegotiationError>;
        async fn offers_for_user(&self, user_id: i64) -> Result<Vec<Offer>, NegotiationError>;
        async fn order_by_id(&self, order_id: i64) -> Result<Option<Order>, NegotiationError>;
        async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, NegotiationError>;
        async fn update_order_status(&self, order_id: i64, user_id: i64, status: OrderStatus) -> Result<Order, NegotiationError>;
    }
}
