use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::info;
use stripe_tools::StripeApi;
use troca_engine::{events::EventProducers, CatalogApi, ChatApi, NegotiationApi, SqliteDatabase, UserApi};

use crate::{
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    integrations::websocket::create_websocket_event_handlers,
    middleware::WebhookSignatureMiddlewareFactory,
    routes::{
        health,
        AcceptOfferRoute,
        CategoriesRoute,
        ChatDetailRoute,
        ChatMessagesRoute,
        DeclineOfferRoute,
        LoginRoute,
        MakeOfferRoute,
        MyChatsRoute,
        MyOffersRoute,
        MyOrdersRoute,
        NewChatRoute,
        OrderDetailRoute,
        PendingOfferRoute,
        ProductDetailRoute,
        RegisterRoute,
        SendMessageRoute,
        UpdateOrderRoute,
    },
    stripe_routes::{wallet_balance, wallet_transactions, ConfirmPaymentRoute, PayOfferRoute, StripeWebhookRoute},
    ws::{WebSocketRoute, WsRegistry},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let registry = WsRegistry::new();
    let handlers = create_websocket_event_handlers(registry.clone());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    info!("📡️ Websocket notifier subscribed to engine events");
    let srv = create_server_instance(config, db, registry, producers)?;
    Ok(srv.await?)
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    registry: WsRegistry,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let stripe_api =
        StripeApi::new(config.stripe.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let webhook_secret = config.stripe.webhook_secret.clone();
    let srv = HttpServer::new(move || {
        let users_api = UserApi::new(db.clone());
        let catalog_api = CatalogApi::new(db.clone());
        let chats_api = ChatApi::new(db.clone(), producers.clone());
        let negotiation_api = NegotiationApi::new(db.clone(), producers.clone());
        let jwt_signer = TokenIssuer::new(&config.auth);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("troca::access_log"))
            .app_data(web::Data::new(users_api))
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(chats_api))
            .app_data(web::Data::new(negotiation_api))
            .app_data(web::Data::new(stripe_api.clone()))
            .app_data(web::Data::new(jwt_signer))
            .app_data(web::Data::new(registry.clone()));
        // Stripe calls this scope, not end users. Requests the webhook secret does not vouch for never
        // reach the handler.
        let webhook_scope = web::scope("/stripe")
            .wrap(WebhookSignatureMiddlewareFactory::new(webhook_secret.clone()))
            .service(StripeWebhookRoute::<SqliteDatabase>::new());
        app.service(health)
            .service(RegisterRoute::<SqliteDatabase>::new())
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(CategoriesRoute::<SqliteDatabase>::new())
            .service(ProductDetailRoute::<SqliteDatabase>::new())
            .service(NewChatRoute::<SqliteDatabase>::new())
            .service(MyChatsRoute::<SqliteDatabase>::new())
            .service(ChatDetailRoute::<SqliteDatabase>::new())
            .service(SendMessageRoute::<SqliteDatabase>::new())
            .service(ChatMessagesRoute::<SqliteDatabase>::new())
            .service(MakeOfferRoute::<SqliteDatabase>::new())
            .service(PendingOfferRoute::<SqliteDatabase>::new())
            .service(MyOffersRoute::<SqliteDatabase>::new())
            .service(AcceptOfferRoute::<SqliteDatabase>::new())
            .service(DeclineOfferRoute::<SqliteDatabase>::new())
            .service(PayOfferRoute::<SqliteDatabase, SqliteDatabase>::new())
            .service(ConfirmPaymentRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrderDetailRoute::<SqliteDatabase>::new())
            .service(UpdateOrderRoute::<SqliteDatabase>::new())
            .service(wallet_balance)
            .service(wallet_transactions)
            .service(WebSocketRoute::<SqliteDatabase>::new())
            .service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
