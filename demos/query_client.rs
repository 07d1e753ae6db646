use anyhow::Result;
use zenoh::{Config, Session};

/// Queries a running historian for the latest snapshot and one history window
///
/// Usage: query_client [sensor] [n]
#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let sensor = args.next().unwrap_or_else(|| "temperatura".to_string());
    let n = args.next().unwrap_or_else(|| "10".to_string());

    let session = zenoh::open(Config::default())
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    println!("Zenoh session opened\n");

    println!("== iot/api/latest");
    query(&session, "iot/api/latest").await?;

    let selector = format!("iot/api/history/{}?n={}", sensor, n);
    println!("\n== {}", selector);
    query(&session, &selector).await?;

    session.close().await.map_err(|e| anyhow::anyhow!("{}", e))?;
    Ok(())
}

async fn query(session: &Session, selector: &str) -> Result<()> {
    let replies = session
        .get(selector)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let mut answered = false;
    while let Ok(reply) = replies.recv_async().await {
        answered = true;
        match reply.result() {
            Ok(sample) => print_json(&sample.payload().to_bytes()),
            Err(err) => {
                print!("error: ");
                print_json(&err.payload().to_bytes());
            }
        }
    }

    if !answered {
        println!("No reply. Is iot-historian running?");
    }
    Ok(())
}

fn print_json(bytes: &[u8]) {
    match serde_json::from_slice::<serde_json::Value>(bytes) {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => println!("{}", text),
            Err(_) => println!("{}", String::from_utf8_lossy(bytes)),
        },
        Err(_) => println!("{}", String::from_utf8_lossy(bytes)),
    }
}
