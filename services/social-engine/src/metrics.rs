use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    // Accounts
    pub static ref SIGNUPS: IntCounter = register_int_counter!(
        "social_signups_total",
        "Total users registered"
    ).expect("metric can be created");

    pub static ref LOGINS: IntCounter = register_int_counter!(
        "social_logins_total",
        "Total successful logins"
    ).expect("metric can be created");

    // Tweets
    pub static ref TWEETS_CREATED: IntCounter = register_int_counter!(
        "social_tweets_created_total",
        "Total tweets created"
    ).expect("metric can be created");

    pub static ref TWEETS_DELETED: IntCounter = register_int_counter!(
        "social_tweets_deleted_total",
        "Total tweets deleted"
    ).expect("metric can be created");

    // Edges; no-op calls are not counted
    pub static ref FOLLOWS: IntCounter = register_int_counter!(
        "social_follows_total",
        "Total follow edges created"
    ).expect("metric can be created");

    pub static ref UNFOLLOWS: IntCounter = register_int_counter!(
        "social_unfollows_total",
        "Total follow edges removed"
    ).expect("metric can be created");

    pub static ref LIKES: IntCounter = register_int_counter!(
        "social_likes_total",
        "Total like requests"
    ).expect("metric can be created");

    pub static ref UNLIKES: IntCounter = register_int_counter!(
        "social_unlikes_total",
        "Total unlike requests"
    ).expect("metric can be created");

    pub static ref REFUSED_OPERATIONS: IntCounterVec = register_int_counter_vec!(
        "social_refused_operations_total",
        "Operations refused, by error kind",
        &["kind"]
    ).expect("metric can be created");
}

/// Generate metrics output in Prometheus text format
pub fn metrics_handler() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_handler() {
        TWEETS_CREATED.inc();
        REFUSED_OPERATIONS.with_label_values(&["self_reference"]).inc();

        let output = metrics_handler().unwrap();
        assert!(output.contains("social_tweets_created_total"));
        assert!(output.contains("social_refused_operations_total"));
    }
}
