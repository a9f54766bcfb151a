pub const THREE_FAMILIES: &str = r#"# HELP http_requests_total The total number of HTTP requests.
# TYPE http_requests_total counter
http_requests_total{method="post",code="200"} 1027 1395066363000
http_requests_total{method="post",code="400"}    3 1395066363000

# HELP process_open_fds Number of open file descriptors.
# TYPE process_open_fds gauge
process_open_fds 42
build_info{version="1.2.3",revision="abc"} 1
"#;

pub const HISTOGRAM: &str = r#"# HELP http_request_duration_seconds A histogram of the request duration.
# TYPE http_request_duration_seconds histogram
http_request_duration_seconds_bucket{handler="/",le="0.05"} 24054
http_request_duration_seconds_bucket{handler="/",le="0.1"} 33444
http_request_duration_seconds_bucket{handler="/",le="0.5"} 129389
http_request_duration_seconds_bucket{handler="/",le="+Inf"} 144320
http_request_duration_seconds_sum{handler="/"} 53423
http_request_duration_seconds_count{handler="/"} 144320
http_request_duration_seconds_bucket{handler="/api",le="0.05"} 10
http_request_duration_seconds_bucket{handler="/api",le="+Inf"} 12
http_request_duration_seconds_sum{handler="/api"} 0.7
http_request_duration_seconds_count{handler="/api"} 12
"#;

pub const SUMMARY: &str = r#"# HELP rpc_duration_seconds A summary of the RPC duration in seconds.
# TYPE rpc_duration_seconds summary
rpc_duration_seconds{quantile="0.01"} 3102
rpc_duration_seconds{quantile="0.5"} 4773
rpc_duration_seconds{quantile="0.99"} 76656
rpc_duration_seconds_sum 1.7560473e+07
rpc_duration_seconds_count 2693
"#;

pub const DUPLICATE_FAMILY: &str = r#"# TYPE jobs_queued gauge
jobs_queued{queue="default"} 3
jobs_queued{queue="mail"} 1
# TYPE workers gauge
workers 4
# TYPE jobs_queued gauge
jobs_queued{queue="default"} 7
"#;

/// `jobs_queued` comes back without its headers.
pub const RESTATED_FAMILY: &str = r#"# HELP jobs_queued Jobs waiting per queue.
# TYPE jobs_queued gauge
jobs_queued{queue="default"} 3
# TYPE workers gauge
workers 4
jobs_queued{queue="default"} 7
"#;

/// `rpc_duration_seconds_sum` and `_count` arrive after another family.
pub const SPLIT_SUMMARY: &str = r#"# TYPE rpc_duration_seconds summary
rpc_duration_seconds{quantile="0.5"} 4773
# TYPE workers gauge
workers 4
rpc_duration_seconds_sum 1.7560473e+07
rpc_duration_seconds_count 2693
"#;

/// The first two families are fine, the third one breaks on line 7.
pub const BROKEN_THIRD_FAMILY: &str = r#"# HELP jobs_total Jobs processed.
# TYPE jobs_total counter
jobs_total 3
# TYPE workers gauge
workers 2
# TYPE queue_depth gauge
queue_depth{queue="a" 1
"#;
