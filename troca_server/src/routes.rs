//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution:
//!
//! ```nocompile
//!     async fn my_handler() -> impl Responder {
//!         tokio::time::sleep(Duration::from_secs(5)).await; // <-- Ok. Worker thread will handle other requests here
//!     }
//! ```
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use troca_engine::{
    db_types::NewOffer,
    CatalogApi,
    CatalogManagement,
    ChatApi,
    ChatApiError,
    ChatManagement,
    NegotiationApi,
    NegotiationDatabase,
    NegotiationError,
    UserApi,
    UserManagement,
};

use crate::{
    auth::{JwtClaims, TokenIssuer},
    data_objects::{
        AccessTokenResponse,
        LoginRequest,
        NewChatRequest,
        NewOfferRequest,
        PaginatedResponse,
        Pagination,
        ProductDetailResponse,
        RegisterUserRequest,
        RegisteredUserResponse,
        SendMessageRequest,
        UpdateOrderRequest,
    },
    errors::{AuthError, ServerError},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(register => Post "/auth/register" impl UserManagement);
/// Route handler for the registration endpoint
///
/// Anyone can create an account by supplying a name, an email address and a password (twice). The response
/// carries the new user's id; clients log in with the `/auth/login` endpoint afterwards.
///
/// A mismatched password confirmation or a missing field is a 400. An email address that is already registered
/// comes back as a 401 without revealing which account it clashes with.
pub async fn register<B: UserManagement>(
    body: web::Json<RegisterUserRequest>,
    api: web::Data<UserApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻️ POST register for {}", req.email);
    if req.name.is_empty() || req.email.is_empty() || req.password.is_empty() || req.confirm_password.is_empty() {
        return Err(ServerError::InvalidRequestBody("All fields are required".to_string()));
    }
    if req.password != req.confirm_password {
        return Err(ServerError::InvalidRequestBody("Passwords do not match".to_string()));
    }
    let user = api.register(&req.name, &req.email, &req.password).await.map_err(|e| {
        debug!("💻️ Could not register {}. {e}", req.email);
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Created().json(RegisteredUserResponse { id: user.id }))
}

route!(login => Post "/auth/login" impl UserManagement);
/// Route handler for the login endpoint
///
/// This route is used to authenticate a user and issue a JWT token.
///
/// Wrong email and wrong password are indistinguishable in the response. If the credentials check out, the
/// server issues a bearer token that clients present in the `Authorization` header on every other endpoint.
/// The token is valid for a configurable period (24 hours by default) and will NOT refresh.
pub async fn login<B: UserManagement>(
    body: web::Json<LoginRequest>,
    api: web::Data<UserApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻️ POST login for {}", req.email);
    let user = api.verify_credentials(&req.email, &req.password).await.map_err(|e| {
        debug!("💻️ Could not verify credentials for {}. {e}", req.email);
        ServerError::from(e)
    })?;
    let user = user.ok_or(AuthError::InvalidCredentials)?;
    let access_token = signer.issue_token(&user)?;
    trace!("💻️ Issued access token for user #{}", user.id);
    Ok(HttpResponse::Ok().json(AccessTokenResponse { access_token }))
}

//----------------------------------------------   Catalog  ----------------------------------------------------
route!(categories => Get "/categories" impl CatalogManagement);
/// Route handler for the category list
///
/// The list is fixed and seeded with the schema, so no authentication is required. Clients use it to label
/// and filter listings.
pub async fn categories<B: CatalogManagement>(api: web::Data<CatalogApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET categories");
    let categories = api.categories().await.map_err(|e| {
        debug!("💻️ Could not fetch categories. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(categories))
}

route!(product_detail => Get "/products/{id}" impl CatalogManagement);
/// Route handler for a single product listing
///
/// Browsing is public. The response carries the listing's fields plus its images in display order.
pub async fn product_detail<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    debug!("💻️ GET product #{product_id}");
    let (product, images) = api
        .product_with_images(product_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Product {product_id} does not exist")))?;
    Ok(HttpResponse::Ok().json(ProductDetailResponse { product, images }))
}

//----------------------------------------------   Chats  ----------------------------------------------------
route!(new_chat => Post "/chats" impl ChatManagement);
/// Route handler for opening a conversation about a product
///
/// Returns 201 with the new chat, or 200 with the existing one when the caller has already opened a chat
/// about this product with this seller.
pub async fn new_chat<B: ChatManagement>(
    claims: JwtClaims,
    body: web::Json<NewChatRequest>,
    api: web::Data<ChatApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻️ POST new_chat for product #{} by user #{}", req.product_id, claims.sub);
    let (chat, created) = api.create_chat(req.product_id, claims.sub, req.seller_id).await.map_err(|e| {
        debug!("💻️ Could not open chat for product #{}. {e}", req.product_id);
        ServerError::from(e)
    })?;
    let response = if created { HttpResponse::Created().json(chat) } else { HttpResponse::Ok().json(chat) };
    Ok(response)
}

route!(my_chats => Get "/chats" impl ChatManagement);
/// Route handler for the chat list
///
/// Returns one page of the caller's conversations, most recently active first, in a
/// `{data, total, page, limit}` envelope. Page size defaults to 10.
pub async fn my_chats<B: ChatManagement>(
    claims: JwtClaims,
    query: web::Query<Pagination>,
    api: web::Data<ChatApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (page, limit) = query.into_inner().sanitized();
    debug!("💻️ GET my_chats for user #{}", claims.sub);
    let (chats, total) = api.chats_for_user(claims.sub, page, limit).await.map_err(|e| {
        debug!("💻️ Could not fetch chats for user #{}. {e}", claims.sub);
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(PaginatedResponse::new(chats, total, page, limit)))
}

route!(chat_detail => Get "/chats/{id}" impl ChatManagement);
/// Route handler for a single conversation
///
/// The detail includes the product summary, both participants, the message history and the offer history.
/// Non-participants get a 404; whether the chat exists at all is not disclosed.
pub async fn chat_detail<B: ChatManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<ChatApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let chat_id = path.into_inner();
    debug!("💻️ GET chat #{chat_id} for user #{}", claims.sub);
    let detail = api.chat_by_id(chat_id, claims.sub).await?.ok_or(ChatApiError::ChatNotFound)?;
    Ok(HttpResponse::Ok().json(detail))
}

//----------------------------------------------   Messages  ----------------------------------------------------
route!(send_message => Post "/messages/chat/{chat_id}" impl ChatManagement);
/// Route handler for posting a message to a conversation
///
/// The sender must be a participant of the chat. The saved message is returned and also pushed to both
/// participants over the websocket, so clients that sent the message via REST still see it arrive in real time.
pub async fn send_message<B: ChatManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<SendMessageRequest>,
    api: web::Data<ChatApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let chat_id = path.into_inner();
    let req = body.into_inner();
    debug!("💻️ POST send_message in chat #{chat_id} by user #{}", claims.sub);
    if req.text.is_empty() {
        return Err(ServerError::InvalidRequestBody("Message text must not be empty".to_string()));
    }
    let message = api.send_message(chat_id, claims.sub, &req.text).await.map_err(|e| {
        debug!("💻️ Could not send message in chat #{chat_id}. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Created().json(message))
}

route!(chat_messages => Get "/messages/chat/{chat_id}" impl ChatManagement);
/// Route handler for a conversation's message history, oldest first. Participants only.
pub async fn chat_messages<B: ChatManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<ChatApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let chat_id = path.into_inner();
    debug!("💻️ GET messages of chat #{chat_id} for user #{}", claims.sub);
    let messages = api.messages_for_chat(chat_id, claims.sub).await.map_err(|e| {
        debug!("💻️ Could not fetch messages of chat #{chat_id}. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(messages))
}

//----------------------------------------------   Offers  ----------------------------------------------------
route!(make_offer => Post "/offers/chat/{chat_id}" impl NegotiationDatabase);
/// Route handler for making an offer in a conversation
///
/// The offer starts out PENDING and is addressed to the product's owner. The engine rejects non-positive
/// amounts, offers on one's own product, and a second offer while the chat already has a PENDING one.
pub async fn make_offer<B: NegotiationDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<NewOfferRequest>,
    api: web::Data<NegotiationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let chat_id = path.into_inner();
    let req = body.into_inner();
    debug!("💻️ POST make_offer of {} in chat #{chat_id} by user #{}", req.amount, claims.sub);
    let offer = api.make_offer(NewOffer::new(chat_id, req.product_id, claims.sub, req.amount)).await.map_err(|e| {
        debug!("💻️ Could not make offer in chat #{chat_id}. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Created().json(offer))
}

route!(pending_offer => Get "/offers/chat/{chat_id}" impl NegotiationDatabase);
/// Route handler for a conversation's open offer
///
/// A chat carries at most one PENDING offer at a time; this returns it, or a 404 when there is none.
pub async fn pending_offer<B: NegotiationDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<NegotiationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let chat_id = path.into_inner();
    debug!("💻️ GET pending offer of chat #{chat_id} for user #{}", claims.sub);
    let offer = api.pending_offer_for_chat(chat_id).await?.ok_or(NegotiationError::OfferNotFound)?;
    Ok(HttpResponse::Ok().json(offer))
}

route!(my_offers => Get "/offers" impl NegotiationDatabase);
/// Route handler for the caller's offers, sent and received, newest first.
pub async fn my_offers<B: NegotiationDatabase>(
    claims: JwtClaims,
    api: web::Data<NegotiationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_offers for user #{}", claims.sub);
    let offers = api.offers_for_user(claims.sub).await.map_err(|e| {
        debug!("💻️ Could not fetch offers for user #{}. {e}", claims.sub);
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(offers))
}

route!(accept_offer => Post "/offers/{id}/accept" impl NegotiationDatabase);
/// Route handler for accepting an offer
///
/// Only the offer's recipient can accept it, and only while it is PENDING. Acceptance creates the order in the
/// same transaction; the response carries the updated offer, and the order shows up under `/orders`.
pub async fn accept_offer<B: NegotiationDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<NegotiationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let offer_id = path.into_inner();
    debug!("💻️ POST accept_offer #{offer_id} by user #{}", claims.sub);
    let (offer, order) = api.accept_offer(offer_id, claims.sub).await.map_err(|e| {
        debug!("💻️ Could not accept offer #{offer_id}. {e}");
        ServerError::from(e)
    })?;
    trace!("💻️ Order #{} created for offer #{offer_id}", order.id);
    Ok(HttpResponse::Ok().json(offer))
}

route!(decline_offer => Post "/offers/{id}/decline" impl NegotiationDatabase);
/// Route handler for declining an offer
///
/// Only the offer's recipient can decline it, and only while it is PENDING. DECLINED is terminal; the buyer is
/// free to make a new offer in the same chat afterwards.
pub async fn decline_offer<B: NegotiationDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<NegotiationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let offer_id = path.into_inner();
    debug!("💻️ POST decline_offer #{offer_id} by user #{}", claims.sub);
    let offer = api.decline_offer(offer_id, claims.sub).await.map_err(|e| {
        debug!("💻️ Could not decline offer #{offer_id}. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(offer))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(my_orders => Get "/orders" impl NegotiationDatabase);
/// Route handler for the caller's orders, as purchaser or seller, newest first.
pub async fn my_orders<B: NegotiationDatabase>(
    claims: JwtClaims,
    api: web::Data<NegotiationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_orders for user #{}", claims.sub);
    let orders = api.orders_for_user(claims.sub).await.map_err(|e| {
        debug!("💻️ Could not fetch orders for user #{}. {e}", claims.sub);
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_detail => Get "/orders/{id}" impl NegotiationDatabase);
/// Route handler for a single order
///
/// Orders are visible to their two parties only. Unlike chats, the existence of an order is not secret:
/// outsiders get a 403 rather than a 404.
pub async fn order_detail<B: NegotiationDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<NegotiationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order #{order_id} for user #{}", claims.sub);
    let order = api.order_by_id(order_id).await?.ok_or(NegotiationError::OrderNotFound(order_id))?;
    if order.seller_id != claims.sub && order.purchaser_id != claims.sub {
        return Err(ServerError::InsufficientPermissions("You can only view your own orders".to_string()));
    }
    Ok(HttpResponse::Ok().json(order))
}

route!(update_order => Put "/orders/{id}" impl NegotiationDatabase);
/// Route handler for updating an order's status
///
/// Either party can move the order between PENDING, COMPLETED and CANCELLED once the goods change hands
/// (or don't). The fetch happens first so that outsiders get a 403 instead of a 404.
pub async fn update_order<B: NegotiationDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<UpdateOrderRequest>,
    api: web::Data<NegotiationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let status = body.into_inner().status;
    debug!("💻️ PUT update_order #{order_id} to {status} by user #{}", claims.sub);
    let order = api.order_by_id(order_id).await?.ok_or(NegotiationError::OrderNotFound(order_id))?;
    if order.seller_id != claims.sub && order.purchaser_id != claims.sub {
        return Err(ServerError::InsufficientPermissions("You can only update your own orders".to_string()));
    }
    let order = api.update_order_status(order_id, claims.sub, status).await.map_err(|e| {
        debug!("💻️ Could not update order #{order_id}. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(order))
}
