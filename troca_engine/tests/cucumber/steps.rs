use std::time::Duration;

use cucumber::{given, then, when};
use troca_common::Centavos;
use troca_engine::{
    db_types::{NewOffer, NewProduct, OfferStatus, OrderStatus},
    CatalogManagement,
};

use crate::cucumber::TrocaWorld;

#[given(expr = "a user named {word}")]
async fn register_user(world: &mut TrocaWorld, name: String) {
    let sys = world.system_mut();
    let email = format!("{}@example.com", name.to_lowercase());
    let user =
        sys.users.register(&name, &email, "correct horse battery staple").await.expect("Error registering user");
    sys.user_ids.insert(name, user.id);
}

#[given(expr = "{word} lists {string} in category {int} for {int} BRL")]
async fn list_product(world: &mut TrocaWorld, name: String, title: String, category: i64, price: i64) {
    let sys = world.system_mut();
    let author = sys.user(&name);
    let product =
        NewProduct::new(title.clone(), format!("Anúncio: {title}"), Centavos::from_reais(price), category, author);
    let product = sys.db.create_product(product).await.expect("Error listing product");
    sys.product_ids.insert(title, product.id);
}

#[given(expr = "{word} opens a chat with {word} about {string}")]
#[when(expr = "{word} opens a chat with {word} about {string}")]
async fn open_chat(world: &mut TrocaWorld, requester: String, seller: String, title: String) {
    let sys = world.system_mut();
    let requester = sys.user(&requester);
    let seller = sys.user(&seller);
    let product_id = sys.product(&title);
    match sys.chats.create_chat(product_id, requester, seller).await {
        Ok((chat, created)) => {
            sys.chat_id = Some(chat.id);
            sys.chat_product = Some(product_id);
            sys.chat_created = Some(created);
            sys.last_error = None;
        },
        Err(e) => sys.last_error = Some(e.to_string()),
    }
}

#[given(expr = "{word} opens chats with {word} about {int} listed products")]
async fn seed_chats(world: &mut TrocaWorld, buyer: String, seller: String, count: i64) {
    let sys = world.system_mut();
    let buyer_id = sys.user(&buyer);
    let seller_id = sys.user(&seller);
    for i in 1..=count {
        let title = format!("Produto {i}");
        let product =
            NewProduct::new(title.clone(), format!("Anúncio: {title}"), Centavos::from_reais(10), 1, seller_id);
        let product = sys.db.create_product(product).await.expect("Error listing product");
        sys.product_ids.insert(title, product.id);
        let (chat, _) = sys.chats.create_chat(product.id, buyer_id, seller_id).await.expect("Error opening chat");
        sys.chat_id = Some(chat.id);
        sys.chat_product = Some(product.id);
    }
}

#[when(expr = "{word} sends {string}")]
async fn send_message(world: &mut TrocaWorld, name: String, text: String) {
    let sys = world.system_mut();
    let user = sys.user(&name);
    let chat_id = sys.chat_id();
    match sys.chats.send_message(chat_id, user, &text).await {
        Ok(_) => sys.last_error = None,
        Err(e) => sys.last_error = Some(e.to_string()),
    }
}

#[when(expr = "{word} offers {int} BRL")]
async fn make_offer(world: &mut TrocaWorld, name: String, amount: i64) {
    let sys = world.system_mut();
    let sender = sys.user(&name);
    let offer = NewOffer::new(sys.chat_id(), sys.chat_product(), sender, Centavos::from_reais(amount));
    match sys.negotiation.make_offer(offer).await {
        Ok(offer) => {
            sys.offer_id = Some(offer.id);
            sys.last_error = None;
        },
        Err(e) => sys.last_error = Some(e.to_string()),
    }
}

#[when(expr = "{word} accepts the offer")]
async fn accept_offer(world: &mut TrocaWorld, name: String) {
    let sys = world.system_mut();
    let user = sys.user(&name);
    let offer_id = sys.offer_id();
    match sys.negotiation.accept_offer(offer_id, user).await {
        Ok((_, order)) => {
            sys.order_id = Some(order.id);
            sys.last_error = None;
        },
        Err(e) => sys.last_error = Some(e.to_string()),
    }
}

#[when(expr = "{word} declines the offer")]
async fn decline_offer(world: &mut TrocaWorld, name: String) {
    let sys = world.system_mut();
    let user = sys.user(&name);
    let offer_id = sys.offer_id();
    match sys.negotiation.decline_offer(offer_id, user).await {
        Ok(_) => sys.last_error = None,
        Err(e) => sys.last_error = Some(e.to_string()),
    }
}

#[when(expr = "{word} starts payment for the offer")]
async fn start_payment(world: &mut TrocaWorld, name: String) {
    let sys = world.system_mut();
    let user = sys.user(&name);
    let offer_id = sys.offer_id();
    match sys.negotiation.offer_for_payment(offer_id, user).await {
        Ok(_) => sys.last_error = None,
        Err(e) => sys.last_error = Some(e.to_string()),
    }
}

#[when(expr = "a payment intent {word} is attached to the offer")]
async fn attach_intent(world: &mut TrocaWorld, intent: String) {
    let sys = world.system_mut();
    let offer_id = sys.offer_id();
    match sys.negotiation.attach_payment_intent(offer_id, &intent).await {
        Ok(_) => sys.last_error = None,
        Err(e) => sys.last_error = Some(e.to_string()),
    }
}

#[when("the payment for the offer is confirmed")]
async fn confirm_payment(world: &mut TrocaWorld) {
    let sys = world.system_mut();
    let offer_id = sys.offer_id();
    match sys.negotiation.complete_payment(offer_id).await {
        Ok(_) => sys.last_error = None,
        Err(e) => sys.last_error = Some(e.to_string()),
    }
}

#[when(expr = "{word} marks the order as {word}")]
async fn mark_order(world: &mut TrocaWorld, name: String, status: String) {
    let sys = world.system_mut();
    let user = sys.user(&name);
    let order_id = sys.order_id();
    match sys.negotiation.update_order_status(order_id, user, OrderStatus::from(status)).await {
        Ok(_) => sys.last_error = None,
        Err(e) => sys.last_error = Some(e.to_string()),
    }
}

#[when(expr = "I pause for {int}ms")]
async fn pause(_world: &mut TrocaWorld, ms: u64) {
    let delay = Duration::from_millis(ms);
    tokio::time::sleep(delay).await;
}

#[then(expr = "the request is rejected with {string}")]
async fn request_rejected(world: &mut TrocaWorld, expected: String) {
    let sys = world.system();
    let err = sys.last_error.as_ref().expect("Expected the last request to fail, but it succeeded");
    assert!(err.contains(&expected), "Expected an error containing '{expected}', got '{err}'");
}

#[then("no new chat is created")]
async fn no_new_chat(world: &mut TrocaWorld) {
    let sys = world.system();
    assert_eq!(sys.chat_created, Some(false), "A new chat was created");
}

#[then(expr = "the offer status is {word}")]
async fn offer_status(world: &mut TrocaWorld, status: String) {
    let sys = world.system();
    let offer = sys
        .negotiation
        .offer_by_id(sys.offer_id())
        .await
        .expect("Error fetching offer")
        .expect("Offer does not exist");
    assert_eq!(offer.status, OfferStatus::from(status), "Offer status is incorrect");
}

#[then(expr = "the offer carries payment intent {word}")]
async fn offer_carries_intent(world: &mut TrocaWorld, intent: String) {
    let sys = world.system();
    let offer = sys
        .negotiation
        .offer_by_id(sys.offer_id())
        .await
        .expect("Error fetching offer")
        .expect("Offer does not exist");
    assert_eq!(offer.payment_intent_id.as_deref(), Some(intent.as_str()), "Payment intent is incorrect");
}

#[then(expr = "the chat has a pending offer of {int} BRL")]
async fn chat_has_pending_offer(world: &mut TrocaWorld, amount: i64) {
    let sys = world.system();
    let offer = sys
        .negotiation
        .pending_offer_for_chat(sys.chat_id())
        .await
        .expect("Error fetching pending offer")
        .expect("No pending offer in the chat");
    assert_eq!(offer.amount, Centavos::from_reais(amount), "Pending offer amount is incorrect");
}

#[then("the chat has no pending offer")]
async fn chat_has_no_pending_offer(world: &mut TrocaWorld) {
    let sys = world.system();
    let offer = sys.negotiation.pending_offer_for_chat(sys.chat_id()).await.expect("Error fetching pending offer");
    assert!(offer.is_none(), "The chat should have no pending offer");
}

#[then(expr = "an order exists with {word} as seller and {word} as purchaser for {int} BRL")]
async fn order_exists(world: &mut TrocaWorld, seller: String, purchaser: String, amount: i64) {
    let sys = world.system();
    let seller_id = sys.user(&seller);
    let purchaser_id = sys.user(&purchaser);
    let orders = sys.negotiation.orders_for_user(seller_id).await.expect("Error fetching orders");
    let amount = Centavos::from_reais(amount);
    let found = orders
        .iter()
        .any(|o| o.seller_id == seller_id && o.purchaser_id == purchaser_id && o.amount == amount);
    assert!(found, "No matching order found");
}

#[then(expr = "{word} has no orders")]
async fn no_orders(world: &mut TrocaWorld, name: String) {
    let sys = world.system();
    let user = sys.user(&name);
    let orders = sys.negotiation.orders_for_user(user).await.expect("Error fetching orders");
    assert!(orders.is_empty(), "Expected no orders, found {}", orders.len());
}

#[then(expr = "the order status is {word}")]
async fn order_status(world: &mut TrocaWorld, status: String) {
    let sys = world.system();
    let order = sys
        .negotiation
        .order_by_id(sys.order_id())
        .await
        .expect("Error fetching order")
        .expect("Order does not exist");
    assert_eq!(order.status, OrderStatus::from(status), "Order status is incorrect");
}

#[then(expr = "the chat log for {word} contains {string}")]
async fn chat_log_contains(world: &mut TrocaWorld, name: String, expected: String) {
    let sys = world.system();
    let user = sys.user(&name);
    let messages = sys.chats.messages_for_chat(sys.chat_id(), user).await.expect("Error fetching messages");
    assert!(messages.iter().any(|m| m.text == expected), "No message with text '{expected}' in the chat");
}

#[then(expr = "the chat log for {word} has {int} messages")]
async fn chat_log_count(world: &mut TrocaWorld, name: String, count: usize) {
    let sys = world.system();
    let user = sys.user(&name);
    let messages = sys.chats.messages_for_chat(sys.chat_id(), user).await.expect("Error fetching messages");
    assert_eq!(messages.len(), count, "Message count is incorrect");
}

#[then(expr = "{word} cannot read the chat")]
async fn cannot_read_chat(world: &mut TrocaWorld, name: String) {
    let sys = world.system();
    let user = sys.user(&name);
    let detail = sys.chats.chat_by_id(sys.chat_id(), user).await.expect("Error fetching chat");
    assert!(detail.is_none(), "The chat should not be visible to {name}");
}

#[then(expr = "the chat list for {word} shows {string} first")]
async fn chat_list_first(world: &mut TrocaWorld, name: String, title: String) {
    let sys = world.system();
    let user = sys.user(&name);
    let (chats, _) = sys.chats.chats_for_user(user, 1, 10).await.expect("Error fetching chat list");
    let first = chats.first().expect("Chat list is empty");
    assert_eq!(first.product.name, title, "Wrong chat at the top of the list");
}

#[then(expr = "page {int} of the chat list for {word} has {int} chats and a total of {int}")]
async fn chat_list_page(world: &mut TrocaWorld, page: i64, name: String, count: usize, total: i64) {
    let sys = world.system();
    let user = sys.user(&name);
    let (chats, total_count) = sys.chats.chats_for_user(user, page, 10).await.expect("Error fetching chat list");
    assert_eq!(chats.len(), count, "Page size is incorrect");
    assert_eq!(total_count, total, "Total chat count is incorrect");
}
