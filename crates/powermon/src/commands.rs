//! Subcommand implementations.
//!
//! Each function validates its configuration first and returns an error
//! before touching the network, then wires the library pieces together.

use std::net::IpAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::{bail, Context};
use powermon_client::application::liveness::LivenessMonitor;
use powermon_client::application::probe_sender::ProbeSchedule;
use powermon_client::application::timeout_controller::ShutdownAction;
use powermon_client::infrastructure::hardware_addresses::{
    collect_identity, local_interfaces, LocalInterfaces,
};
use powermon_client::infrastructure::http_probe::HttpProber;
use powermon_client::infrastructure::shutdown::{CommandShutdown, SystemShutdown};
use powermon_client::infrastructure::verify_report::VerificationReporter;
use powermon_core::config::{ClientConfig, PushoverConfig, ServerConfig};
use powermon_core::notify::{notify_best_effort, NoopNotifier, PushoverNotifier, PushoverSettings};
use powermon_core::{build_target_set, Notifier, ProbeEndpoint, Scheme};
use powermon_server::application::wake_dispatcher::{start_dispatch, DispatchConfig};
use powermon_server::infrastructure::http_ingress::serve;
use powermon_server::infrastructure::udp_wake::UdpWakeSender;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Builds the Pushover notifier, or a no-op one when it is not configured.
pub fn build_notifier(
    pushover: PushoverConfig,
    nickname: Option<String>,
) -> anyhow::Result<Arc<dyn Notifier>> {
    let settings = PushoverSettings::from_options(pushover.token, pushover.users, nickname)
        .context("invalid Pushover configuration")?;
    let notifier: Arc<dyn Notifier> = match settings {
        Some(settings) => Arc::new(PushoverNotifier::new(settings)?),
        None => Arc::new(NoopNotifier),
    };
    Ok(notifier)
}

fn endpoint(cfg: &ClientConfig) -> anyhow::Result<ProbeEndpoint> {
    let Some(host) = cfg.host.as_deref() else {
        bail!("no server address given: use -a/--host or set [client] host");
    };
    let scheme = if cfg.tls { Scheme::Https } else { Scheme::Http };
    ProbeEndpoint::new(host, cfg.port, scheme).context("invalid server address")
}

/// `powermon client`
pub async fn run_client(
    cfg: ClientConfig,
    nickname: &str,
    notifier: Arc<dyn Notifier>,
) -> anyhow::Result<()> {
    cfg.validate().context("invalid client configuration")?;
    let endpoint = endpoint(&cfg)?;
    let identity = cfg
        .verify
        .then(|| collect_identity(&LocalInterfaces, nickname));
    let prober = HttpProber::new(
        &endpoint,
        Duration::from_secs(cfg.probe_timeout_secs),
        identity.as_ref(),
    )?;
    let shutdown: Arc<dyn ShutdownAction> = match cfg.on_timeout {
        Some(command) => Arc::new(CommandShutdown::new(command)),
        None => Arc::new(SystemShutdown::new(cfg.sudo)),
    };

    let stop = Arc::new(AtomicBool::new(false));
    let monitor = LivenessMonitor {
        prober: Arc::new(prober),
        schedule: ProbeSchedule {
            interval: Duration::from_secs(cfg.interval_secs),
            retry_interval: Duration::from_secs(cfg.retry_interval_secs),
        },
        timeout: Duration::from_secs(cfg.timeout_secs),
        shutdown,
        notifier,
        stop: Arc::clone(&stop),
    };

    info!(
        "monitoring {endpoint}, shutting down after {}s without an answer",
        cfg.timeout_secs
    );
    tokio::select! {
        exit = monitor.run() => info!("client finished: {exit:?}"),
        _ = tokio::signal::ctrl_c() => {
            info!("received Ctrl-C, stopping");
            stop.store(true, Ordering::Relaxed);
        }
    }
    Ok(())
}

fn listen_port(port: u32) -> anyhow::Result<u16> {
    match u16::try_from(port) {
        Ok(p) if p != 0 => Ok(p),
        _ => bail!("invalid port {port}: must be between 1 and 65535"),
    }
}

/// `powermon server`
pub async fn run_server(cfg: ServerConfig, notifier: Arc<dyn Notifier>) -> anyhow::Result<()> {
    cfg.validate().context("invalid server configuration")?;
    let targets = build_target_set(cfg.wake.as_slice(), cfg.wakelist.as_deref())
        .context("invalid wake targets")?;
    let port = listen_port(cfg.port)?;
    let bind: IpAddr = cfg
        .bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", cfg.bind))?;
    let broadcast: IpAddr = cfg
        .broadcast
        .parse()
        .with_context(|| format!("invalid broadcast address '{}'", cfg.broadcast))?;

    let listener = match TcpListener::bind((bind, port)).await {
        Ok(listener) => listener,
        Err(e) => {
            notify_best_effort(notifier.as_ref(), &format!("Error starting powermon server: {e}"));
            return Err(e).with_context(|| format!("failed to listen on {bind}:{port}"));
        }
    };

    let dispatch = DispatchConfig {
        tick_interval: Duration::from_secs(cfg.tick_interval_secs),
        attempt_budget: cfg.attempt_budget,
        verify: cfg.verify,
    };
    let sender = Arc::new(UdpWakeSender::new(broadcast, cfg.wol_port));
    let (tracker, dispatcher) = start_dispatch(targets, dispatch, sender, Arc::clone(&notifier));

    info!("listening on port {port}");
    notify_best_effort(
        notifier.as_ref(),
        &format!("Server started, listening on port {port}"),
    );

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl-C, shutting down");
        }
    };
    let served = serve(listener, tracker, shutdown).await;

    if let Some(handle) = dispatcher {
        handle.abort();
    }
    if let Err(e) = &served {
        error!("server error: {e}");
        notify_best_effort(notifier.as_ref(), &format!("Error running powermon server: {e}"));
    }
    served.context("HTTP server failed")
}

/// `powermon verify`
pub async fn run_verify(cfg: ClientConfig, nickname: &str) -> anyhow::Result<()> {
    let endpoint = endpoint(&cfg)?;
    let identity = collect_identity(&LocalInterfaces, nickname);
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    VerificationReporter::new(&endpoint, client)
        .report(&identity)
        .await
        .with_context(|| format!("failed to report to {endpoint}"))?;
    println!("Verification sent to {endpoint}");
    Ok(())
}

/// `powermon mac`
pub fn run_mac() -> anyhow::Result<()> {
    for interface in local_interfaces().context("failed to list network interfaces")? {
        println!("{interface}");
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use powermon_core::notify::mock::RecordingNotifier;

    #[test]
    fn test_listen_port_range() {
        assert_eq!(listen_port(10101).unwrap(), 10101);
        assert!(listen_port(0).is_err());
        assert!(listen_port(70000).is_err());
    }

    #[test]
    fn test_endpoint_requires_host() {
        let err = endpoint(&ClientConfig::default()).unwrap_err();
        assert!(err.to_string().contains("--host"));
    }

    #[test]
    fn test_endpoint_rejects_bad_port_before_any_probe() {
        let cfg = ClientConfig {
            host: Some("127.0.0.1".into()),
            port: 0,
            ..ClientConfig::default()
        };
        assert!(endpoint(&cfg).is_err());
    }

    #[test]
    fn test_notifier_requires_both_tokens() {
        let only_token = PushoverConfig {
            token: Some("app".into()),
            users: Vec::new(),
        };
        assert!(build_notifier(only_token, None).is_err());
        assert!(build_notifier(PushoverConfig::default(), None).is_ok());
    }

    #[tokio::test]
    async fn test_malformed_wake_list_aborts_before_listening() {
        // Arrange
        let path = std::env::temp_dir().join(format!("powermon-bad-wake-{}.txt", std::process::id()));
        std::fs::write(&path, "aa:aa:aa:aa:aa:aa\nnot-a-mac\n").unwrap();
        let cfg = ServerConfig {
            wakelist: Some(path),
            ..ServerConfig::default()
        };

        // Act
        let err = run_server(cfg, Arc::new(NoopNotifier)).await.unwrap_err();

        // Assert
        let message = format!("{err:#}");
        assert!(message.contains("not-a-mac"), "got: {message}");
        assert!(message.contains("line 2"), "got: {message}");
    }

    #[tokio::test]
    async fn test_zero_tick_interval_aborts_before_listening() {
        // Arrange
        let notifier = Arc::new(RecordingNotifier::new());
        let cfg = ServerConfig {
            wake: vec!["aa:aa:aa:aa:aa:aa".into()],
            verify: true,
            tick_interval_secs: 0,
            port: 1,
            ..ServerConfig::default()
        };

        // Act
        let err = run_server(cfg, notifier.clone()).await.unwrap_err();

        // Assert
        let message = format!("{err:#}");
        assert!(message.contains("tick_interval_secs"), "got: {message}");
        assert!(notifier.messages().is_empty(), "nothing was started");
    }

    #[tokio::test]
    async fn test_zero_attempt_budget_aborts_before_listening() {
        let cfg = ServerConfig {
            attempt_budget: 0,
            port: 1,
            ..ServerConfig::default()
        };

        let err = run_server(cfg, Arc::new(NoopNotifier)).await.unwrap_err();

        assert!(format!("{err:#}").contains("attempt_budget"));
    }

    #[tokio::test]
    async fn test_client_rejects_retry_interval_not_below_interval() {
        // Arrange
        let cfg = ClientConfig {
            host: Some("127.0.0.1".into()),
            interval_secs: 5,
            retry_interval_secs: 5,
            ..ClientConfig::default()
        };

        // Act
        let err = run_client(cfg, "nas", Arc::new(NoopNotifier))
            .await
            .unwrap_err();

        // Assert
        assert!(format!("{err:#}").contains("retry_interval_secs"));
    }

    #[tokio::test]
    async fn test_client_rejects_zero_probe_timeout() {
        let cfg = ClientConfig {
            host: Some("127.0.0.1".into()),
            probe_timeout_secs: 0,
            ..ClientConfig::default()
        };

        let err = run_client(cfg, "nas", Arc::new(NoopNotifier))
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("probe_timeout_secs"));
    }
}
