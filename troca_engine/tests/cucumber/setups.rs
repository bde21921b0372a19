use cucumber::given;

use crate::cucumber::{troca_world::MarketplaceSystem, TrocaWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut TrocaWorld) {
    let system = MarketplaceSystem::new().await;
    world.system = Some(system);
}
