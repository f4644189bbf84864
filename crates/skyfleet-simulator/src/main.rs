//! SkyFleet Simulator CLI
//!
//! Seeds a fleet and an order book, allocates deliveries, and runs the
//! tick simulation until the fleet finishes or the tick budget runs out.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::time::sleep;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use skyfleet_domain::{Coordinate, Delivery, DeliveryStatus, Drone, Obstacle, Order, Priority};
use skyfleet_persistence::{
    DeliveryRepository, DroneRepository, MemoryRepository, OrderRepository,
};
use skyfleet_planner::AllocationEngine;
use skyfleet_simulator::{SimulationEngine, TickScheduler};

#[derive(Parser, Debug)]
#[command(name = "skyfleet-simulator")]
#[command(about = "Simulate a delivery drone fleet over a demo order book")]
struct Args {
    /// Number of drones in the fleet
    #[arg(short, long, default_value = "3")]
    drones: usize,

    /// Tick interval in milliseconds
    #[arg(long, default_value = "250")]
    tick_ms: u64,

    /// Maximum ticks before the run is cut off
    #[arg(long, default_value = "200")]
    max_ticks: u32,

    /// Advance tick-by-tick instead of on a timer
    #[arg(long)]
    step: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("skyfleet=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let repo = Arc::new(MemoryRepository::new());

    info!("Starting fleet simulation: {} drones", args.drones);

    let base = Coordinate::new(0.0, 0.0);
    let drones = seed_drones(&repo, args.drones, base).await?;
    let orders = seed_orders(&repo).await?;
    info!("Seeded {} orders", orders.len());

    // A single no-fly zone between the base and the northern customers.
    let obstacles = vec![Obstacle {
        location: Coordinate::new(25.0, 60.0),
        radius: 8.0,
    }];

    let planner = AllocationEngine::new(base, obstacles);
    let allocations = planner.allocate(&orders, &drones);
    info!("Planned {} deliveries", allocations.len());

    let mut engine = SimulationEngine::new(Arc::clone(&repo));
    for drone in drones {
        engine.register_drone(drone);
    }

    let mut dispatched = 0usize;
    for allocation in allocations {
        let mut bundled = allocation.orders.clone();
        for order in &mut bundled {
            order.assign();
            repo.update_order_status(order.id, order.status).await?;
        }
        let delivery = Delivery::new(
            Uuid::new_v4(),
            allocation.drone_id,
            bundled,
            allocation.route.clone(),
        )?;
        repo.create_delivery(&delivery).await?;
        engine.register_delivery(delivery);
        dispatched += 1;
    }
    info!("Dispatched {} deliveries", dispatched);

    let mut scheduler = TickScheduler::new(engine);
    if args.step {
        for tick in 0..args.max_ticks {
            scheduler.step_once().await;
            if all_done(&scheduler).await {
                info!("Fleet finished after {} ticks", tick + 1);
                break;
            }
        }
    } else {
        scheduler.start(Duration::from_millis(args.tick_ms));
        for _ in 0..args.max_ticks {
            sleep(Duration::from_millis(args.tick_ms)).await;
            if all_done(&scheduler).await {
                break;
            }
        }
        scheduler.stop();
    }

    let engine = scheduler.engine();
    let stats = engine.lock().await.stats();
    info!(
        "Run complete | deliveries: {}/{} | avg time: {:.2} min | distance flown: {:.2}",
        stats.completed_deliveries,
        stats.total_deliveries,
        stats.average_delivery_time,
        stats.total_distance
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}

async fn all_done(scheduler: &TickScheduler<MemoryRepository>) -> bool {
    let engine = scheduler.engine();
    let engine = engine.lock().await;
    engine
        .deliveries()
        .all(|d| d.status == DeliveryStatus::Completed)
}

async fn seed_drones(
    repo: &Arc<MemoryRepository>,
    count: usize,
    base: Coordinate,
) -> Result<Vec<Drone>> {
    let mut drones = Vec::with_capacity(count);
    for i in 0..count {
        let drone = Drone::new(
            Uuid::new_v4(),
            format!("SF-{:02}", i + 1),
            10.0 + (i % 3) as f64 * 5.0,
            250.0,
            base,
        )?;
        repo.create_drone(&drone).await?;
        drones.push(drone);
    }
    Ok(drones)
}

async fn seed_orders(repo: &Arc<MemoryRepository>) -> Result<Vec<Order>> {
    let spots = [
        (Coordinate::new(10.0, 20.0), 2.5, Priority::High),
        (Coordinate::new(-30.0, 15.0), 4.0, Priority::Medium),
        (Coordinate::new(12.0, 22.0), 1.5, Priority::Low),
        (Coordinate::new(50.0, 80.0), 6.0, Priority::High),
        (Coordinate::new(-15.0, -40.0), 3.0, Priority::Medium),
        (Coordinate::new(8.0, 18.0), 2.0, Priority::Low),
    ];

    let mut orders = Vec::with_capacity(spots.len());
    for (location, weight, priority) in spots {
        let order = Order::new(Uuid::new_v4(), location, weight, priority, None)?;
        repo.create_order(&order).await?;
        orders.push(order);
    }
    Ok(orders)
}
