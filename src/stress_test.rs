use async_stream::stream;
use docpatch_core::Value;
use docpatch_store::{DocumentGateway, DocumentId, DocumentStore, StoreConfigBuilder};
use futures::stream::Stream;
use futures::stream::StreamExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Statistics collected during stress testing
#[derive(Clone, Debug)]
pub struct StressTestStats {
    pub num_writers: usize,
    pub writes_per_writer: usize,
    pub total_commits: usize,
    pub total_time: Duration,
    pub avg_write_time: Duration,
    pub ops_per_second: f64,
    pub verified: bool,
}

impl StressTestStats {
    pub fn print(&self) {
        println!("\n╔════════════════════════════════════════════════════════════╗");
        println!("║              Stress Test Statistics                         ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║  Number of Writers:         {:>38} ║", self.num_writers);
        println!("║  Writes per Writer:         {:>38} ║", self.writes_per_writer);
        println!("║  Committed Revisions:       {:>38} ║", self.total_commits);
        println!("║  Total Time:                {:>39}s ║", format!("{:.3}", self.total_time.as_secs_f64()));
        println!("║  Average Write Time:        {:>36}µs ║", format!("{:.2}", self.avg_write_time.as_micros()));
        println!("║  Operations/Second:         {:>38.0} ║", self.ops_per_second);
        println!("║  Verified:                  {:>38} ║", if self.verified { "yes" } else { "NO" });
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

fn new_gateway() -> DocumentGateway {
    let config = StoreConfigBuilder::new().replica_id("stress").build();
    DocumentGateway::new(Arc::new(DocumentStore::new(config)))
}

fn doc_id(gateway: &DocumentGateway, uri: &str) -> Option<DocumentId> {
    gateway
        .resolver()
        .interpret(uri)
        .map(|details| DocumentId::from(details.doc_id.as_str()))
}

fn average(times: &[Duration]) -> Duration {
    if times.is_empty() {
        Duration::ZERO
    } else {
        times.iter().sum::<Duration>() / times.len() as u32
    }
}

/// Generator that yields random edits of a text body
fn text_edit_generator(num_edits: usize, seed_text: String) -> impl Stream<Item = String> {
    stream! {
        let mut rng = StdRng::from_entropy();
        let mut current: Vec<char> = seed_text.chars().collect();
        for round in 0..num_edits {
            let pos = rng.gen_range(0..=current.len());
            if rng.gen_bool(0.3) && pos < current.len() {
                let len = rng.gen_range(1..=(current.len() - pos).min(4));
                current.drain(pos..pos + len);
            } else {
                let ch = char::from(b'a' + (round % 26) as u8);
                current.insert(pos, ch);
            }
            yield current.iter().collect::<String>();
        }
    }
}

/// Many tasks write distinct values to the same key of one document
pub async fn stress_test_writers(num_writers: usize, writes_per_writer: usize) -> StressTestStats {
    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║        Concurrent Writer Stress Test                       ║");
    println!("║  Writers: {} | Writes/Writer: {} ║", num_writers, writes_per_writer);
    println!("╚════════════════════════════════════════════════════════════╝");

    let gateway = new_gateway();
    let uri = gateway.create_document_uri();
    let target = format!("{}/value", uri);

    let start = Instant::now();
    println!("\n[Phase 1/2] Writing from {} tasks...", num_writers);

    let mut handles = vec![];
    for idx in 0..num_writers {
        let gateway = gateway.clone();
        let target = target.clone();
        let handle = tokio::spawn(async move {
            let mut times = Vec::with_capacity(writes_per_writer);
            let mut written = Vec::with_capacity(writes_per_writer);
            for i in 0..writes_per_writer {
                let value = format!("writer_{}_{}", idx, i);
                let write_start = Instant::now();
                if gateway
                    .set_document_uri(&target, Value::from(value.as_str()))
                    .is_ok()
                {
                    written.push(value);
                }
                times.push(write_start.elapsed());

                if i % 100 == 0 {
                    tokio::task::yield_now().await;
                }
            }
            (times, written)
        });
        handles.push(handle);
    }

    let mut write_times = vec![];
    let mut written = HashSet::new();
    for handle in handles {
        if let Ok((times, values)) = handle.await {
            write_times.extend(times);
            written.extend(values);
        }
    }

    println!("[Phase 1/2] ✓ Completed");
    println!("[Phase 2/2] Verifying history...");

    let total_time = start.elapsed();
    let total_commits = doc_id(&gateway, &uri)
        .and_then(|id| gateway.store().history_len(&id).ok())
        .unwrap_or(0);
    let final_value = gateway
        .open_document_uri(&target)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string));

    let verified = total_commits == written.len()
        && final_value.map_or(false, |v| written.contains(&v));
    info!(total_commits, verified, "writer stress test finished");
    println!("[Phase 2/2] ✓ Completed");

    StressTestStats {
        num_writers,
        writes_per_writer,
        total_commits,
        total_time,
        avg_write_time: average(&write_times),
        ops_per_second: write_times.len() as f64 / total_time.as_secs_f64(),
        verified,
    }
}

/// One writer streams random edits into a text body through the gateway
pub async fn stress_test_text(num_edits: usize) -> StressTestStats {
    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║        Text Reconciliation Stress Test                     ║");
    println!("║  Edits: {} ║", num_edits);
    println!("╚════════════════════════════════════════════════════════════╝");

    let gateway = new_gateway();
    let uri = gateway.create_document_uri();
    let body = format!("{}/body", uri);
    let seed = "The quick brown fox jumps over the lazy dog".to_string();
    let replica = gateway.store().replica_id().to_string();
    let seeded = gateway.change_document_uri(&uri, |root| {
        if let Some(map) = root.as_map_mut() {
            map.insert("body".to_string(), Value::text(replica, &seed));
        }
        Ok(())
    });

    let start = Instant::now();
    let mut write_times = vec![];
    let mut last = seed.clone();
    let mut edits = Box::pin(text_edit_generator(num_edits, seed));

    println!("\n[Phase 1/2] Reconciling edits...");
    while let Some(next) = edits.next().await {
        let write_start = Instant::now();
        if gateway.set_document_uri(&body, Value::from(next.as_str())).is_ok() {
            last = next;
        }
        write_times.push(write_start.elapsed());
    }
    println!("[Phase 1/2] ✓ Completed");
    println!("[Phase 2/2] Verifying body...");

    let total_time = start.elapsed();
    let final_body = gateway.open_document_uri(&body).ok();
    let verified = seeded.is_ok()
        && final_body
            .as_ref()
            .and_then(Value::as_text)
            .map_or(false, |text| text.eq_str(&last));
    let total_commits = doc_id(&gateway, &uri)
        .and_then(|id| gateway.store().history_len(&id).ok())
        .unwrap_or(0);
    info!(total_commits, verified, "text stress test finished");
    println!("[Phase 2/2] ✓ Completed");

    StressTestStats {
        num_writers: 1,
        writes_per_writer: num_edits,
        total_commits,
        total_time,
        avg_write_time: average(&write_times),
        ops_per_second: write_times.len() as f64 / total_time.as_secs_f64(),
        verified,
    }
}

/// Writer stress test across growing writer counts
pub async fn stress_test_scaling(max_writers: usize, step_size: usize) {
    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║      Scaling Analysis - Writes vs Concurrent Writers      ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    let mut current_writers = step_size;
    while current_writers <= max_writers {
        let stats = stress_test_writers(current_writers, 50).await;
        stats.print();
        current_writers += step_size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writers_verify() {
        let stats = stress_test_writers(4, 20).await;
        assert!(stats.verified);
        assert_eq!(stats.total_commits, 80);
    }

    #[tokio::test]
    async fn test_text_edits_verify() {
        let stats = stress_test_text(50).await;
        assert!(stats.verified);
    }
}
