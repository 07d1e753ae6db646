use anyhow::Result;
use std::time::Duration;
use zenoh::Config;

const TOPIC_BASE: &str = "iot/czujnik";
const DEVICE_ID: &str = "czujniki-01";
const PERIOD: Duration = Duration::from_secs(2);

/// Random walk over the five weather sensors
struct Weather {
    temperature: f64,
    humidity: f64,
    light: f64,
    wind_direction: f64,
    wind_speed: f64,
}

impl Weather {
    fn new() -> Self {
        Self {
            temperature: 22.0,
            humidity: 45.0,
            light: 300.0,
            wind_direction: 90.0,
            wind_speed: 3.0,
        }
    }

    fn step(&mut self) {
        self.temperature = (self.temperature + jitter(0.15)).clamp(-10.0, 40.0);
        self.humidity = (self.humidity + jitter(0.6)).clamp(10.0, 95.0);

        let cloud = pick(&[0.0, 0.0, 0.0, -120.0, -80.0, 50.0]);
        self.light = (self.light + jitter(30.0) + cloud).clamp(0.0, 2000.0);

        self.wind_direction = (self.wind_direction + jitter(8.0)).rem_euclid(360.0);

        let gust = pick(&[0.0, 0.0, 0.0, 0.0, 1.5, 2.5, -1.0]);
        self.wind_speed = (self.wind_speed + jitter(0.3) + gust).clamp(0.0, 25.0);
    }

    fn readings(&self) -> [(&'static str, serde_json::Value, &'static str); 5] {
        [
            ("temperatura", round(self.temperature, 2), "°C"),
            ("wilgotnosc", round(self.humidity, 1), "%"),
            ("swiatlo", serde_json::json!(self.light as i64), "lux"),
            ("wiatr_kierunek", serde_json::json!(self.wind_direction as i64), "deg"),
            ("wiatr_predkosc", round(self.wind_speed, 2), "m/s"),
        ]
    }
}

/// Uniform in `[-amplitude, amplitude)`
fn jitter(amplitude: f64) -> f64 {
    (fastrand::f64() * 2.0 - 1.0) * amplitude
}

fn pick(choices: &[f64]) -> f64 {
    choices[fastrand::usize(..choices.len())]
}

fn round(value: f64, digits: i32) -> serde_json::Value {
    let scale = 10f64.powi(digits);
    serde_json::json!((value * scale).round() / scale)
}

/// Publishes simulated readings for the historian to ingest
#[tokio::main]
async fn main() -> Result<()> {
    println!("Starting sensor simulator...");

    let session = zenoh::open(Config::default())
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    println!("Zenoh session opened");
    println!(
        "Publishing to {}/{{temperatura,wilgotnosc,swiatlo,wiatr_kierunek,wiatr_predkosc}} every {}s",
        TOPIC_BASE,
        PERIOD.as_secs()
    );
    println!("Start iot-historian in another terminal to ingest this data\n");

    let mut weather = Weather::new();
    let mut rounds = 0u64;

    loop {
        weather.step();
        let timestamp = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();

        for (sensor, value, unit) in weather.readings() {
            let payload = serde_json::json!({
                "id": DEVICE_ID,
                "czas": timestamp,
                "wartosc": value,
                "jednostka": unit,
            });
            session
                .put(format!("{}/{}", TOPIC_BASE, sensor), serde_json::to_vec(&payload)?)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;
        }

        rounds += 1;
        println!(
            "Sent #{}: T={:.2}°C H={:.1}% L={:.0} lux Dir={:.0}° Wind={:.2} m/s",
            rounds,
            weather.temperature,
            weather.humidity,
            weather.light,
            weather.wind_direction,
            weather.wind_speed
        );

        tokio::select! {
            _ = tokio::time::sleep(PERIOD) => {}
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.close().await.map_err(|e| anyhow::anyhow!("{}", e))?;
    println!("\n✓ Published {} rounds", rounds);

    Ok(())
}
