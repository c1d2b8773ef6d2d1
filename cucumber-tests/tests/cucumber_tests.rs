use cucumber::World;
use cucumber_tests::features::world::DocfieldWorld;

#[tokio::main]
async fn main() {
    DocfieldWorld::cucumber().run_and_exit("features/").await;
}
