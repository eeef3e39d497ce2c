pub mod oi_monitor_job;
