//----------------------------------------------   Payments  ----------------------------------------------------

use actix_web::{get, web, HttpRequest, HttpResponse};
use log::{debug, info, trace, warn};
use stripe_tools::{NewPaymentIntent, StripeApi, WebhookEvent, PAYMENT_INTENT_SUCCEEDED};
use troca_engine::{NegotiationApi, NegotiationDatabase, NegotiationError, UserApi, UserApiError, UserManagement};

use crate::{
    auth::JwtClaims,
    data_objects::{JsonResponse, PaymentIntentResponse},
    errors::ServerError,
    route,
};

/// How many balance transactions the wallet endpoint returns.
const BALANCE_TRANSACTION_LIMIT: u32 = 10;

route!(pay_offer => Post "/offers/{id}/pay" impl NegotiationDatabase, UserManagement);
/// Route handler for initiating the payment of an accepted offer
///
/// Only the offer's sender (the buyer) can pay, and only once the offer is ACCEPTED. The handler looks up the
/// buyer's Stripe customer, creating one on first use, then opens a payment intent for the offer amount tagged
/// with the offer id. The client drives the card flow with the returned `client_secret` and then either polls
/// `confirm-payment` or relies on the webhook to settle the offer.
pub async fn pay_offer<BPay, BUser>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<NegotiationApi<BPay>>,
    users: web::Data<UserApi<BUser>>,
    stripe: web::Data<StripeApi>,
) -> Result<HttpResponse, ServerError>
where
    BPay: NegotiationDatabase,
    BUser: UserManagement,
{
    let offer_id = path.into_inner();
    debug!("💳️ POST pay_offer #{offer_id} by user #{}", claims.sub);
    let offer = api.offer_for_payment(offer_id, claims.sub).await.map_err(|e| {
        debug!("💳️ Offer #{offer_id} is not payable by user #{}. {e}", claims.sub);
        ServerError::from(e)
    })?;
    let customer_id = customer_id_for(claims.sub, users.as_ref(), stripe.as_ref()).await?;
    let intent = stripe.create_payment_intent(NewPaymentIntent::new(offer.amount, &customer_id, offer.id)).await?;
    api.attach_payment_intent(offer.id, &intent.id).await.map_err(|e| {
        debug!("💳️ Could not attach payment intent {} to offer #{offer_id}. {e}", intent.id);
        ServerError::from(e)
    })?;
    info!("💳️ Payment intent {} opened for offer #{offer_id}", intent.id);
    let response = PaymentIntentResponse {
        payment_intent_id: intent.id,
        client_secret: intent.client_secret,
        amount: intent.amount,
        status: intent.status,
    };
    Ok(HttpResponse::Ok().json(response))
}

/// Finds the user's Stripe customer id, registering the user with Stripe on first use.
async fn customer_id_for<B: UserManagement>(
    user_id: i64,
    users: &UserApi<B>,
    stripe: &StripeApi,
) -> Result<String, ServerError> {
    let user = users.user_by_id(user_id).await?.ok_or(UserApiError::UserNotFound(user_id))?;
    if let Some(customer_id) = user.stripe_customer_id {
        trace!("💳️ User #{user_id} is already Stripe customer {customer_id}");
        return Ok(customer_id);
    }
    let customer = stripe.create_customer(&user.name, &user.email).await?;
    users.set_stripe_customer_id(user_id, &customer.id).await.map_err(|e| {
        debug!("💳️ Could not save Stripe customer {} for user #{user_id}. {e}", customer.id);
        ServerError::from(e)
    })?;
    Ok(customer.id)
}

route!(confirm_payment => Post "/offers/{id}/confirm-payment" impl NegotiationDatabase);
/// Route handler for confirming the payment of an offer
///
/// Clients poll this after the card flow. The handler asks Stripe for the payment intent's status; anything
/// other than `succeeded` is a 400 and the offer stays ACCEPTED. On success the offer moves to PAID, which is
/// also what the webhook does, so whichever of the two paths runs first wins and the other finds nothing left
/// to confirm.
pub async fn confirm_payment<B: NegotiationDatabase>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<NegotiationApi<B>>,
    stripe: web::Data<StripeApi>,
) -> Result<HttpResponse, ServerError> {
    let offer_id = path.into_inner();
    debug!("💳️ POST confirm_payment for offer #{offer_id} by user #{}", claims.sub);
    let offer = api.offer_awaiting_confirmation(offer_id).await.map_err(|e| {
        debug!("💳️ Offer #{offer_id} is not awaiting confirmation. {e}");
        ServerError::from(e)
    })?;
    let intent_id = offer.payment_intent_id.as_deref().ok_or(NegotiationError::OfferNotFound)?;
    let intent = stripe.fetch_payment_intent(intent_id).await?;
    if !intent.is_succeeded() {
        debug!("💳️ Payment intent {} for offer #{offer_id} is '{}'", intent.id, intent.status);
        return Err(ServerError::PaymentGatewayError("Payment has not been completed yet".to_string()));
    }
    let offer = api.complete_payment(offer_id).await.map_err(|e| {
        debug!("💳️ Could not complete the payment for offer #{offer_id}. {e}");
        ServerError::from(e)
    })?;
    info!("💳️ Offer #{offer_id} settled via confirm-payment");
    Ok(HttpResponse::Ok().json(offer))
}

route!(stripe_webhook => Post "/webhooks" impl NegotiationDatabase);
/// Route handler for Stripe webhook deliveries
///
/// The signature middleware has already verified the payload against the webhook secret by the time this
/// handler runs. Only `payment_intent.succeeded` events are acted on; the offer id travels in the intent's
/// metadata.
pub async fn stripe_webhook<B: NegotiationDatabase>(
    req: HttpRequest,
    body: web::Json<WebhookEvent>,
    api: web::Data<NegotiationApi<B>>,
) -> HttpResponse {
    trace!("💳️ Received webhook request: {}", req.uri());
    let event = body.into_inner();
    // Webhook responses must always be in 200 range once the signature checks out, otherwise Stripe will retry
    let result = if event.event_type == PAYMENT_INTENT_SUCCEEDED {
        settle_offer_from_event(&event, api.as_ref()).await
    } else {
        debug!("💳️ Ignoring webhook event {} of type {}", event.id, event.event_type);
        JsonResponse::success(format!("Ignoring event type {}", event.event_type))
    };
    HttpResponse::Ok().json(result)
}

async fn settle_offer_from_event<B: NegotiationDatabase>(
    event: &WebhookEvent,
    api: &NegotiationApi<B>,
) -> JsonResponse {
    let intent = match event.payment_intent() {
        Ok(intent) => intent,
        Err(e) => {
            warn!("💳️ Could not read the payment intent in webhook event {}. {e}", event.id);
            return JsonResponse::failure("Malformed payment intent.");
        },
    };
    let Some(offer_id) = intent.offer_id() else {
        warn!("💳️ Payment intent {} carries no offer id. Cannot match it to a negotiation.", intent.id);
        return JsonResponse::failure("No offer id in payment intent metadata.");
    };
    match api.complete_payment(offer_id).await {
        Ok(offer) => {
            info!("💳️ Offer #{} settled by webhook event {}", offer.id, event.id);
            JsonResponse::success("Payment recorded.")
        },
        Err(NegotiationError::OfferNotFound) => {
            info!("💳️ Offer #{offer_id} is not awaiting payment. Nothing to do.");
            JsonResponse::success("Offer already settled.")
        },
        Err(e) => {
            warn!("💳️ Could not record the payment for offer #{offer_id}. {e}");
            JsonResponse::failure("Unexpected error recording payment.")
        },
    }
}

//----------------------------------------------   Wallet  ----------------------------------------------------

#[get("/wallet")]
pub async fn wallet_balance(claims: JwtClaims, stripe: web::Data<StripeApi>) -> Result<HttpResponse, ServerError> {
    debug!("💳️ GET wallet balance for user #{}", claims.sub);
    let balance = stripe.fetch_balance().await?;
    Ok(HttpResponse::Ok().json(balance))
}

#[get("/wallet/transactions")]
pub async fn wallet_transactions(
    claims: JwtClaims,
    stripe: web::Data<StripeApi>,
) -> Result<HttpResponse, ServerError> {
    debug!("💳️ GET wallet transactions for user #{}", claims.sub);
    let transactions = stripe.fetch_balance_transactions(BALANCE_TRANSACTION_LIMIT).await?;
    Ok(HttpResponse::Ok().json(transactions))
}
