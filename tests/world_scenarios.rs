use port_tunnel_sim::config::settings::WorldSettings;
use port_tunnel_sim::config::toml_config::TomlConfig;
use port_tunnel_sim::core::lifecycle::{LifecycleSettings, PortLifecycle, StorageCheck};
use port_tunnel_sim::core::ShipDispatcher;
use port_tunnel_sim::domain::capacity::{StorageLayout, Tier};
use port_tunnel_sim::domain::events::SimEvent;
use port_tunnel_sim::domain::model::{Commodity, CommodityKind, Locatable, Location, PortId};
use port_tunnel_sim::{RecordingSink, SeededRandom, SimEngine, World};
use std::sync::Arc;
use std::time::Duration;

fn world_with(settings: WorldSettings, ports: &[(Location, Commodity)], seed: u64) -> (World, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let world = World::with_ports(settings, ports, sink.clone(), Arc::new(SeededRandom::from_seed_u64(seed))).unwrap();
    (world, sink)
}

fn gold(quantity: u64) -> Commodity {
    Commodity::new(CommodityKind::Gold, quantity)
}

#[tokio::test(start_paused = true)]
async fn test_gold_ship_docks_and_doubles_port_stock() {
    let (world, sink) = world_with(WorldSettings::default(), &[(Location::new(3, 4), gold(150))], 1);
    let port = world.port(PortId(1)).unwrap();

    // 1. 運一艘滿載黃金的小船到港口
    let ship = port
        .fabricator()
        .fabricate_with(Location::new(3, 4), Tier::Small, gold(90));
    let ship_id = ship.id;
    world.transit().send_to(ship, port.id(), port.clone()).await.unwrap();
    world.transit().wait().await;

    assert_eq!(port.docked(Tier::Small).await, 1);
    assert!(sink.events().contains(&SimEvent::ShipPlaced {
        ship: ship_id,
        port: PortId(1),
        tier: Tier::Small,
        slot: 0,
    }));

    // 2. 檢查泊位：卸貨並把船再派出去
    let dispatcher: Arc<dyn ShipDispatcher> = Arc::new(world.transit().clone());
    let mut lifecycle = PortLifecycle::new(
        port.clone(),
        dispatcher,
        Arc::new(SeededRandom::from_seed_u64(2)),
        sink.clone(),
        world.cancel_token(),
        LifecycleSettings {
            idle_interval: Duration::from_secs(2),
            generation_pacing: Duration::from_secs(5),
            generation_threshold: 100,
        },
    );
    let check = lifecycle.check_storage().await.unwrap();

    assert_eq!(check, StorageCheck { unloaded: 1, mismatched: 0 });
    assert_eq!(port.quantity().await, 300);
    assert!(sink.events().contains(&SimEvent::ShipUnloaded {
        port: PortId(1),
        ship: ship_id,
        before: 150,
        after: 300,
    }));

    // 3. 唯一的港口就是下一個目的地，空船再次靠港
    world.transit().wait().await;
    let snapshot = world.snapshot().await;
    assert_eq!(snapshot.ports[0].docked_small, 1);
    assert_eq!(snapshot.transit.docked, 2);

    // 空船同種貨物仍然觸發翻倍
    lifecycle.check_storage().await.unwrap();
    assert_eq!(port.quantity().await, 600);
}

#[tokio::test(start_paused = true)]
async fn test_full_storage_redirects_to_other_port() {
    let (world, sink) = world_with(
        WorldSettings::default(),
        &[(Location::new(2, 2), gold(150)), (Location::new(8, 1), gold(150))],
        3,
    );
    let crowded = world.port(PortId(1)).unwrap();
    let spare = world.port(PortId(2)).unwrap();
    for _ in 0..Tier::Small.storage_slots() {
        let filler = crowded.fabricator().fabricate_with(Location::ORIGIN, Tier::Small, gold(90));
        crowded.dock(filler).await.unwrap();
    }

    let ship = crowded.fabricator().fabricate_with(Location::ORIGIN, Tier::Small, gold(90));
    let ship_id = ship.id;
    world.transit().send_to(ship, crowded.id(), crowded.clone()).await.unwrap();
    world.transit().wait().await;

    assert_eq!(crowded.docked(Tier::Small).await, 2);
    assert_eq!(spare.docked(Tier::Small).await, 1);
    assert!(sink.events().contains(&SimEvent::ShipRedirected {
        ship: ship_id,
        from: PortId(1),
        to: PortId(2),
        attempt: 1,
    }));

    let counters = world.transit().counters();
    assert_eq!(counters.redirected, 1);
    assert_eq!(counters.docked, 1);
    assert_eq!(counters.dropped, 0);
}

#[tokio::test(start_paused = true)]
async fn test_redirect_cap_drops_ship() {
    let settings = WorldSettings {
        max_redirects: 3,
        storage: StorageLayout {
            small: 0,
            middle: 4,
            big: 8,
        },
        ..WorldSettings::default()
    };
    let (world, sink) = world_with(
        settings,
        &[(Location::new(1, 1), gold(150)), (Location::new(5, 5), gold(150))],
        4,
    );
    let port = world.port(PortId(1)).unwrap();

    let ship = port.fabricator().fabricate_with(Location::ORIGIN, Tier::Small, gold(90));
    world.transit().send_to(ship, port.id(), port.clone()).await.unwrap();
    world.transit().wait().await;

    assert_eq!(sink.count(|e| matches!(e, SimEvent::ShipRedirected { .. })), 3);
    assert_eq!(sink.count(|e| matches!(e, SimEvent::ShipDropped { redirects: 3, .. })), 1);
    assert_eq!(world.transit().counters().dropped, 1);
    assert_eq!(world.snapshot().await.total_docked(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_tunnel_never_holds_more_than_capacity() {
    let roomy = StorageLayout {
        small: 64,
        middle: 64,
        big: 64,
    };
    let settings = WorldSettings {
        storage: roomy,
        ..WorldSettings::default()
    };
    let (world, sink) = world_with(
        settings,
        &[(Location::new(10, 0), gold(150)), (Location::new(0, 10), gold(150))],
        5,
    );
    let origin = world.port(PortId(1)).unwrap();
    let random = SeededRandom::from_seed_u64(9);

    for _ in 0..50 {
        let ship = origin.fabricator().fabricate(origin.location(), &random);
        world.transit().dispatch(ship, origin.id()).await.unwrap();
    }
    world.transit().wait().await;

    assert_eq!(world.tunnel().peak(), 5);
    assert_eq!(world.tunnel().available(), 5);
    assert!(sink.events().iter().all(|e| match e {
        SimEvent::TunnelEntered { inside, .. } => *inside <= 5,
        _ => true,
    }));
    assert_eq!(world.snapshot().await.total_docked(), 50);
}

#[tokio::test(start_paused = true)]
async fn test_running_world_keeps_doubling_invariant() {
    let (mut world, sink) = world_with(WorldSettings::default(), &[(Location::new(3, 4), gold(150))], 6);

    world.start();
    tokio::time::sleep(Duration::from_secs(60)).await;
    let reports = world.shutdown().await.unwrap();

    assert_eq!(reports.len(), 1);
    assert!(reports[0].lifecycle.ships_fabricated >= 8);
    assert!(sink.count(|e| matches!(e, SimEvent::ShipPlaced { .. })) >= 1);

    let events = sink.events();
    let mut unloads = 0u32;
    for event in &events {
        if let SimEvent::ShipUnloaded { before, after, .. } = event {
            assert_eq!(*after, before.saturating_mul(2));
            unloads += 1;
        }
    }
    let checked: usize = events
        .iter()
        .map(|e| match e {
            SimEvent::StorageChecked { docked, .. } => *docked,
            _ => 0,
        })
        .sum();
    let mismatched = sink.count(|e| matches!(e, SimEvent::CargoMismatch { .. }));
    assert_eq!(unloads as usize + mismatched, checked);

    let expected = 150u64.saturating_mul(2u64.saturating_pow(unloads));
    assert_eq!(world.port(PortId(1)).unwrap().quantity().await, expected);

    assert_eq!(world.tunnel().inside(), 0);
    assert_eq!(world.tunnel().available(), 5);
    assert_eq!(world.transit().in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_engine_runs_from_toml() {
    std::env::set_var("PORT_SIM_TEST_SEED", "42");
    let config = TomlConfig::from_toml_str(
        r#"
[world]
ports = 3
seed = ${PORT_SIM_TEST_SEED}

[tunnel]
capacity = 2

[run]
duration_secs = 30
"#,
    )
    .unwrap();
    let run = config.to_run_config();
    assert_eq!(run.world.seed, Some(42));

    let sink = Arc::new(RecordingSink::new());
    let report = SimEngine::new(run).with_sink(sink.clone()).run().await.unwrap();

    assert_eq!(report.snapshot.ports.len(), 3);
    assert_eq!(report.snapshot.tunnel.capacity, 2);
    assert!(report.snapshot.tunnel.peak <= 2);
    assert_eq!(report.snapshot.tunnel.inside, 0);
    assert_eq!(sink.count(|e| matches!(e, SimEvent::PortStopped { .. })), 3);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["stopped_by"], "duration_elapsed");
}

#[tokio::test(start_paused = true)]
async fn test_ports_keep_checking_storage_when_transit_budget_is_saturated() {
    // 兩個港口、名額很少、無限重新導向：在途的船永遠佔著名額
    let settings = WorldSettings {
        max_in_flight: 4,
        max_redirects: 0,
        storage: StorageLayout {
            small: 1,
            middle: 1,
            big: 1,
        },
        ..WorldSettings::default()
    };
    let (mut world, sink) = world_with(
        settings,
        &[(Location::new(2, 3), gold(150)), (Location::new(7, 1), gold(150))],
        8,
    );
    let storage_checks = |sink: &RecordingSink| sink.count(|e| matches!(e, SimEvent::StorageChecked { .. }));

    world.start();
    tokio::time::sleep(Duration::from_secs(5 * 60)).await;
    let earlier = storage_checks(&sink);
    assert!(world.transit().in_flight() <= 4);

    tokio::time::sleep(Duration::from_secs(5 * 60)).await;
    let later = storage_checks(&sink);
    assert!(world.transit().in_flight() <= 4);
    assert!(later >= earlier + 40, "storage checks stalled: {} then {}", earlier, later);

    let reports = world.shutdown().await.unwrap();
    assert!(reports.iter().all(|r| r.lifecycle.cycles >= 40));
    assert_eq!(world.tunnel().available(), 5);
    assert_eq!(world.transit().in_flight(), 0);
    assert_eq!(world.transit().counters().waiting, 0);
}
