use aws_config::BehaviorVersion;
use aws_sdk_lambda::Client;
use clap::Parser;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

const STATUSES: [&str; 2] = ["armed", "disarmed"];
const LOCATIONS: [&str; 4] = ["home", "office", "garage", "warehouse"];

#[derive(Default)]
struct Stats {
    inserted: usize,
    updated: usize,
    client_errors: usize,
    server_errors: usize,
    transport_errors: usize,
}

#[derive(Deserialize)]
struct FunctionResponse {
    #[serde(rename = "statusCode")]
    status_code: u16,
    body: String,
}

#[derive(Deserialize)]
struct ResponseBody {
    message: String,
}

#[derive(Parser, Debug)]
#[command(name = "invoke-test")]
#[command(about = "Invoke the arm/disarm Lambda function with random device reports")]
struct Args {
    /// Lambda function name
    function: String,

    /// Number of iterations to run
    #[arg(long, default_value = "1000")]
    iters: usize,

    /// Number of parallel threads
    #[arg(long, default_value = "1")]
    threads: usize,

    /// Number of devices (device-1 to device-N)
    #[arg(long, default_value = "100")]
    devices: u32,
}

fn random_report(rng: &mut StdRng, num_devices: u32) -> serde_json::Value {
    let mut report = serde_json::json!({
        "device_id": format!("device-{}", rng.gen_range(1..=num_devices)),
        "status": STATUSES[rng.gen_range(0..STATUSES.len())],
    });
    if rng.gen_bool(0.5) {
        report["user_id"] = format!("user-{}", rng.gen_range(1..=10)).into();
    }
    if rng.gen_bool(0.5) {
        report["location"] = LOCATIONS[rng.gen_range(0..LOCATIONS.len())].into();
    }
    report
}

async fn record(stats: &Mutex<Stats>, payload: &str) {
    let mut stats = stats.lock().await;
    match serde_json::from_str::<FunctionResponse>(payload) {
        Ok(response) if response.status_code == 200 => {
            let message = serde_json::from_str::<ResponseBody>(&response.body)
                .map(|body| body.message)
                .unwrap_or_default();
            if message.contains("inserted") {
                stats.inserted += 1;
            } else {
                stats.updated += 1;
            }
        }
        Ok(response) if (400..500).contains(&response.status_code) => stats.client_errors += 1,
        _ => stats.server_errors += 1,
    }
}

async fn run_invocations(
    client: Arc<Client>,
    function_name: String,
    thread_id: usize,
    start: usize,
    end: usize,
    total: usize,
    num_devices: u32,
    stats: Arc<Mutex<Stats>>,
) -> anyhow::Result<()> {
    let mut rng = StdRng::from_entropy();

    for i in start..=end {
        let report = random_report(&mut rng, num_devices);

        // Same shape API Gateway produces: the report as a JSON string body
        let event = serde_json::json!({ "body": report.to_string() });

        let result = client
            .invoke()
            .function_name(&function_name)
            .payload(aws_sdk_lambda::primitives::Blob::new(serde_json::to_vec(
                &event,
            )?))
            .send()
            .await;

        match result {
            Ok(response) => {
                let response_payload = response
                    .payload()
                    .map(|b| String::from_utf8_lossy(b.as_ref()).to_string())
                    .unwrap_or_else(|| "No response".to_string());

                record(&stats, &response_payload).await;

                println!(
                    "[Thread {}: {}/{}] Reporting {} => {}",
                    thread_id, i, total, report, response_payload
                );
            }
            Err(e) => {
                stats.lock().await.transport_errors += 1;

                eprintln!(
                    "[Thread {}: {}/{}] Error reporting {}: {}",
                    thread_id, i, total, report, e
                );
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    anyhow::ensure!(args.threads > 0, "--threads must be at least 1");
    anyhow::ensure!(args.devices > 0, "--devices must be at least 1");

    println!(
        "Running {} invocations across {} thread(s) for {} device(s)",
        args.iters, args.threads, args.devices
    );

    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let client = Arc::new(Client::new(&config));

    let stats = Arc::new(Mutex::new(Stats::default()));

    let iters_per_thread = args.iters / args.threads;
    let remainder = args.iters % args.threads;

    let mut tasks = JoinSet::new();

    let total_iters = args.iters;
    let num_devices = args.devices;

    let mut start = 1;
    for t in 1..=args.threads {
        let end = if t == args.threads {
            start + iters_per_thread - 1 + remainder
        } else {
            start + iters_per_thread - 1
        };

        let client = Arc::clone(&client);
        let function_name = args.function.clone();
        let stats = Arc::clone(&stats);

        tasks.spawn(async move {
            run_invocations(
                client,
                function_name,
                t,
                start,
                end,
                total_iters,
                num_devices,
                stats,
            )
            .await
        });

        start = end + 1;
    }

    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => eprintln!("Worker failed: {}", e),
            Err(e) => eprintln!("Task failed: {}", e),
        }
    }

    let stats = stats.lock().await;
    println!("Completed {} invocations", args.iters);
    println!();
    println!("Results:");
    println!("  Inserted:       {}", stats.inserted);
    println!("  Updated:        {}", stats.updated);
    println!("  Client errors:  {}", stats.client_errors);
    println!("  Server errors:  {}", stats.server_errors);
    println!("  Invoke errors:  {}", stats.transport_errors);
    Ok(())
}
