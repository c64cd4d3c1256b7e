//! The TabController keeps tab metadata, the strip and surface bindings
//! for one window.

mod events;
mod lifecycle;
mod navigation;
mod timers;
mod types;

pub use types::*;

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::effects::Effect;
    use crate::error::TabError;
    use crate::settings::TabSettings;
    use crate::tab::TabState;
    use tabweave_common::{SurfaceId, TabId, WindowId};
    use tabweave_webview::{RelayEvent, RelayEventKind};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Controller with its initial home tab, effects drained.
    fn controller() -> (TabController, TabId) {
        let mut ctl = TabController::new(TabSettings::default());
        let home = ctl.active_id().cloned().unwrap();
        ctl.drain_effects();
        (ctl, home)
    }

    fn event(surface: u32, kind: RelayEventKind) -> RelayEvent {
        RelayEvent {
            window: WindowId(1),
            surface_id: Some(SurfaceId(surface)),
            kind,
        }
    }

    fn bound(ctl: &mut TabController, url: &str, surface: u32) -> TabId {
        let id = ctl.open_tab(Some(url), false).unwrap();
        ctl.on_surface_ready(&id, SurfaceId(surface)).unwrap();
        ctl.drain_effects();
        id
    }

    // =========================================================================
    // Opening
    // =========================================================================

    #[test]
    fn starts_with_one_home_tab() {
        let mut ctl = TabController::new(TabSettings::default());
        assert_eq!(ctl.len(), 1);
        let tab = ctl.active().unwrap().clone();
        assert_eq!(tab.url, "about:home");
        assert_eq!(tab.title, "New Tab");
        assert_eq!(tab.state, TabState::SurfaceBinding);
        assert_eq!(tab.partition.as_str(), "persist:default");

        let effects = ctl.drain_effects();
        assert_eq!(
            effects,
            vec![Effect::SpawnSurface {
                tab_id: tab.id.clone(),
                url: "about:blank".into(),
                partition: tab.partition.clone(),
                visible: false,
            }]
        );
    }

    #[test]
    fn open_tab_activates_and_spawns_visible_surface() {
        let (mut ctl, _) = controller();
        let id = ctl.open_tab(Some("https://a.test/"), false).unwrap();
        assert_eq!(ctl.active_id(), Some(&id));
        assert_eq!(ctl.toolbar().url, "https://a.test/");
        assert!(matches!(
            ctl.drain_effects().as_slice(),
            [Effect::SpawnSurface { visible: true, url, .. }] if url == "https://a.test/"
        ));
    }

    #[test]
    fn incognito_tabs_get_unique_memory_partitions() {
        let (mut ctl, home) = controller();
        let a = ctl.open_incognito().unwrap();
        let b = ctl.open_incognito().unwrap();
        let pa = ctl.tab(&a).unwrap().partition.clone();
        let pb = ctl.tab(&b).unwrap().partition.clone();
        assert_eq!(pa.as_str(), format!("memory:incognito-{a}"));
        assert_ne!(pa, pb);
        assert_ne!(pa, ctl.tab(&home).unwrap().partition);
        assert_eq!(ctl.tab(&a).unwrap().title, "New Incognito Tab");
        assert!(!pa.is_durable());
    }

    // =========================================================================
    // Binding
    // =========================================================================

    #[test]
    fn first_ready_binds_and_creates_surface() {
        let (mut ctl, home) = controller();
        ctl.on_surface_ready(&home, SurfaceId(7)).unwrap();
        let tab = ctl.tab(&home).unwrap();
        assert_eq!(tab.state, TabState::Bound);
        assert_eq!(tab.surface, Some(SurfaceId(7)));
        assert_eq!(
            ctl.drain_effects(),
            vec![Effect::CreateSurface {
                tab_id: home.clone(),
                surface_id: SurfaceId(7),
                partition: ctl.tab(&home).unwrap().partition.clone(),
            }]
        );
    }

    #[test]
    fn repeated_ready_is_a_noop() {
        let (mut ctl, home) = controller();
        ctl.on_surface_ready(&home, SurfaceId(7)).unwrap();
        ctl.drain_effects();
        ctl.on_surface_ready(&home, SurfaceId(7)).unwrap();
        assert!(ctl.drain_effects().is_empty());
    }

    #[test]
    fn ready_with_new_surface_destroys_the_old_one() {
        let (mut ctl, home) = controller();
        ctl.on_surface_ready(&home, SurfaceId(7)).unwrap();
        ctl.drain_effects();

        ctl.on_surface_ready(&home, SurfaceId(8)).unwrap();
        let effects = ctl.drain_effects();
        assert_eq!(effects[0], Effect::DestroySurface { surface_id: SurfaceId(7) });
        assert!(matches!(
            effects[1],
            Effect::CreateSurface { surface_id: SurfaceId(8), .. }
        ));
        assert!(ctl.tab_for_surface(SurfaceId(7)).is_none());
        assert_eq!(ctl.tab_for_surface(SurfaceId(8)).unwrap().id, home);

        let stale = event(7, RelayEventKind::TitleUpdated { title: "old".into() });
        assert_eq!(
            ctl.handle_event(&stale, Instant::now()),
            Err(TabError::StaleEvent(SurfaceId(7)))
        );
        assert_eq!(ctl.tab(&home).unwrap().title, "New Tab");
    }

    #[test]
    fn ready_for_closed_tab_destroys_orphan() {
        let (mut ctl, _home) = controller();
        let id = ctl.open_tab(Some("https://a.test/"), false).unwrap();
        ctl.close_tab(&id).unwrap();
        ctl.drain_effects();

        let err = ctl.on_surface_ready(&id, SurfaceId(9)).unwrap_err();
        assert_eq!(err, TabError::NotFound(id));
        assert_eq!(
            ctl.drain_effects(),
            vec![Effect::DestroySurface { surface_id: SurfaceId(9) }]
        );
    }

    #[test]
    fn navigation_before_binding_is_replayed_on_bind() {
        let (mut ctl, home) = controller();
        ctl.toolbar_command(ToolbarCommand::LoadUrl("https://later.test/".into()))
            .unwrap();
        assert!(ctl.drain_effects().is_empty());

        ctl.on_surface_ready(&home, SurfaceId(3)).unwrap();
        let effects = ctl.drain_effects();
        assert_eq!(
            effects.last(),
            Some(&Effect::Navigate {
                surface_id: SurfaceId(3),
                url: "https://later.test/".into(),
                visible: true,
            })
        );
    }

    // =========================================================================
    // Closing
    // =========================================================================

    #[test]
    fn close_destroys_surface_and_selects_previous() {
        let (mut ctl, home) = controller();
        let a = bound(&mut ctl, "https://a.test/", 1);
        let b = bound(&mut ctl, "https://b.test/", 2);
        assert_eq!(ctl.active_id(), Some(&b));

        let closed = ctl.close_tab(&b).unwrap();
        assert_eq!(closed.state, TabState::Gone);
        assert_eq!(
            ctl.drain_effects(),
            vec![Effect::DestroySurface { surface_id: SurfaceId(2) }]
        );
        assert_eq!(ctl.active_id(), Some(&a));
        assert_eq!(ctl.toolbar().url, "https://a.test/");
        assert_eq!(ctl.order(), &[home, a]);
    }

    #[test]
    fn closing_first_active_tab_selects_new_first() {
        let (mut ctl, home) = controller();
        let a = bound(&mut ctl, "https://a.test/", 1);
        ctl.activate(&home).unwrap();
        ctl.close_tab(&home).unwrap();
        assert_eq!(ctl.active_id(), Some(&a));
    }

    #[test]
    fn closing_unbound_tab_emits_no_destroy() {
        let (mut ctl, _home) = controller();
        let a = ctl.open_tab(Some("https://a.test/"), false).unwrap();
        ctl.drain_effects();
        ctl.close_tab(&a).unwrap();
        assert!(ctl.drain_effects().is_empty());
    }

    #[test]
    fn closing_last_tab_closes_window_for_good() {
        let (mut ctl, home) = controller();
        ctl.on_surface_ready(&home, SurfaceId(7)).unwrap();
        ctl.drain_effects();

        ctl.close_tab(&home).unwrap();
        assert_eq!(
            ctl.drain_effects(),
            vec![
                Effect::DestroySurface { surface_id: SurfaceId(7) },
                Effect::CloseWindow
            ]
        );
        assert!(ctl.is_closed());
        assert!(ctl.is_empty());
        assert_eq!(ctl.open_tab(None, false), Err(TabError::WindowClosed));
        assert_eq!(
            ctl.toolbar_command(ToolbarCommand::Reload),
            Err(TabError::WindowClosed)
        );
    }

    #[test]
    fn close_unknown_tab_is_not_found() {
        let (mut ctl, _) = controller();
        let ghost = TabId::from("ghost");
        assert_eq!(ctl.close_tab(&ghost), Err(TabError::NotFound(ghost)));
    }

    // =========================================================================
    // Events
    // =========================================================================

    #[test]
    fn url_and_title_updates_reach_the_toolbar() {
        let (mut ctl, _home) = controller();
        let a = bound(&mut ctl, "https://a.test/", 1);
        let now = Instant::now();

        ctl.handle_event(&event(1, RelayEventKind::DidNavigate { url: "https://a.test/x".into() }), now)
            .unwrap();
        ctl.handle_event(&event(1, RelayEventKind::TitleUpdated { title: "X".into() }), now)
            .unwrap();

        let tab = ctl.tab(&a).unwrap();
        assert_eq!(tab.url, "https://a.test/x");
        assert_eq!(tab.title, "X");
        assert_eq!(tab.favicon.as_deref(), Some("https://a.test/favicon.ico"));
        assert_eq!(ctl.toolbar().url, "https://a.test/x");
        assert_eq!(ctl.toolbar().title, "X");
    }

    #[test]
    fn placeholder_urls_and_titles_are_ignored() {
        let (mut ctl, _home) = controller();
        let a = bound(&mut ctl, "https://a.test/", 1);
        let now = Instant::now();
        for kind in [
            RelayEventKind::DidNavigate { url: "about:blank".into() },
            RelayEventKind::FinishLoad { url: String::new() },
            RelayEventKind::TitleUpdated { title: "   ".into() },
            RelayEventKind::TitleChanged { title: "about:blank".into() },
        ] {
            ctl.handle_event(&event(1, kind), now).unwrap();
        }
        let tab = ctl.tab(&a).unwrap();
        assert_eq!(tab.url, "https://a.test/");
        assert_eq!(tab.title, "New Tab");
        assert!(!ctl.history_pending(&a));
    }

    #[test]
    fn updates_to_background_tabs_leave_toolbar_alone() {
        let (mut ctl, _home) = controller();
        let a = bound(&mut ctl, "https://a.test/", 1);
        let _b = bound(&mut ctl, "https://b.test/", 2);
        ctl.handle_event(&event(1, RelayEventKind::TitleUpdated { title: "A".into() }), Instant::now())
            .unwrap();
        assert_eq!(ctl.tab(&a).unwrap().title, "A");
        assert_eq!(ctl.toolbar().url, "https://b.test/");
        assert_ne!(ctl.toolbar().title, "A");

        ctl.activate(&a).unwrap();
        assert_eq!(ctl.toolbar().title, "A");
        assert_eq!(ctl.toolbar().url, "https://a.test/");
    }

    #[test]
    fn favicon_event_takes_first_url() {
        let (mut ctl, _home) = controller();
        let a = bound(&mut ctl, "https://a.test/", 1);
        let urls = vec!["https://cdn.test/i.png".to_string(), "https://a.test/x.ico".to_string()];
        ctl.handle_event(&event(1, RelayEventKind::FaviconUpdated { urls }), Instant::now())
            .unwrap();
        assert_eq!(ctl.tab(&a).unwrap().favicon.as_deref(), Some("https://cdn.test/i.png"));
        assert_eq!(ctl.toolbar().favicon.as_deref(), Some("https://cdn.test/i.png"));

        ctl.handle_event(&event(1, RelayEventKind::FaviconUpdated { urls: vec![] }), Instant::now())
            .unwrap();
        assert_eq!(ctl.tab(&a).unwrap().favicon, None);
    }

    #[test]
    fn events_from_unknown_surfaces_are_stale() {
        let (mut ctl, _) = controller();
        let err = ctl
            .handle_event(&event(42, RelayEventKind::FinishLoad { url: "https://x.test/".into() }), Instant::now())
            .unwrap_err();
        assert_eq!(err, TabError::StaleEvent(SurfaceId(42)));
    }

    #[test]
    fn download_events_are_ignored() {
        let (mut ctl, _) = controller();
        let event = RelayEvent {
            window: WindowId(1),
            surface_id: None,
            kind: RelayEventKind::DownloadCancelled {
                id: tabweave_webview::downloads::DownloadId(5),
            },
        };
        assert!(ctl.handle_event(&event, Instant::now()).is_ok());
        assert!(ctl.drain_effects().is_empty());
    }

    // =========================================================================
    // New windows
    // =========================================================================

    #[test]
    fn new_window_opens_tab_and_dedupes() {
        let (mut ctl, _home) = controller();
        bound(&mut ctl, "https://a.test/", 1);
        let t0 = Instant::now();
        let open = |url: &str| event(1, RelayEventKind::NewWindow { url: url.into() });

        ctl.handle_event(&open("https://b.test/"), t0).unwrap();
        assert_eq!(ctl.len(), 3);
        ctl.handle_event(&open("https://b.test/"), t0 + ms(299)).unwrap();
        assert_eq!(ctl.len(), 3);
        ctl.handle_event(&open("https://c.test/"), t0 + ms(299)).unwrap();
        assert_eq!(ctl.len(), 4);
        ctl.handle_event(&open("https://c.test/"), t0 + ms(700)).unwrap();
        assert_eq!(ctl.len(), 5);
        assert_eq!(ctl.active().unwrap().url, "https://c.test/");
    }

    #[test]
    fn new_window_from_incognito_stays_incognito() {
        let (mut ctl, _home) = controller();
        let private = ctl.open_incognito().unwrap();
        ctl.on_surface_ready(&private, SurfaceId(4)).unwrap();
        ctl.handle_event(
            &event(4, RelayEventKind::NewWindow { url: "https://p.test/".into() }),
            Instant::now(),
        )
        .unwrap();
        let opened = ctl.active().unwrap();
        assert!(opened.incognito);
        assert_ne!(opened.partition, ctl.tab(&private).unwrap().partition);
    }

    #[test]
    fn blank_new_window_is_ignored() {
        let (mut ctl, _) = controller();
        let event = RelayEvent {
            window: WindowId(1),
            surface_id: None,
            kind: RelayEventKind::NewWindow { url: "  ".into() },
        };
        ctl.handle_event(&event, Instant::now()).unwrap();
        assert_eq!(ctl.len(), 1);
    }

    // =========================================================================
    // History
    // =========================================================================

    #[test]
    fn history_is_debounced_per_tab() {
        let (mut ctl, _home) = controller();
        let a = bound(&mut ctl, "https://a.test/", 1);
        let t0 = Instant::now();

        ctl.handle_event(&event(1, RelayEventKind::FinishLoad { url: "https://a.test/".into() }), t0)
            .unwrap();
        ctl.handle_event(&event(1, RelayEventKind::TitleUpdated { title: "A".into() }), t0 + ms(300))
            .unwrap();
        assert_eq!(ctl.poll(t0 + ms(600)), 0);
        assert_eq!(ctl.next_deadline(), Some(t0 + ms(800)));
        assert_eq!(ctl.poll(t0 + ms(800)), 1);

        assert_eq!(
            ctl.drain_effects(),
            vec![Effect::WriteHistory {
                tab_id: a.clone(),
                entry: crate::HistoryEntry {
                    url: "https://a.test/".into(),
                    title: "A".into(),
                    favicon: Some("https://a.test/favicon.ico".into()),
                },
            }]
        );
        assert!(!ctl.history_pending(&a));
    }

    #[test]
    fn navigations_inside_debounce_record_only_final_url() {
        let (mut ctl, _home) = controller();
        let a = bound(&mut ctl, "https://example.com/", 1);
        let t0 = Instant::now();

        ctl.handle_event(&event(1, RelayEventKind::FinishLoad { url: "https://example.com/".into() }), t0)
            .unwrap();
        ctl.handle_event(
            &event(1, RelayEventKind::FinishLoad { url: "https://example.org/".into() }),
            t0 + ms(100),
        )
        .unwrap();
        assert_eq!(ctl.poll(t0 + ms(700)), 1);

        let written: Vec<String> = ctl
            .drain_effects()
            .into_iter()
            .filter_map(|e| match e {
                Effect::WriteHistory { tab_id, entry } if tab_id == a => Some(entry.url),
                _ => None,
            })
            .collect();
        assert_eq!(written, vec!["https://example.org/".to_string()]);
    }

    #[test]
    fn navigations_past_debounce_record_each_url() {
        let (mut ctl, _home) = controller();
        let a = bound(&mut ctl, "https://example.com/", 1);
        let t0 = Instant::now();
        let mut written = Vec::new();
        let mut collect = |ctl: &mut TabController| {
            for effect in ctl.drain_effects() {
                if let Effect::WriteHistory { tab_id, entry } = effect {
                    assert_eq!(tab_id, a);
                    written.push(entry.url);
                }
            }
        };

        ctl.handle_event(&event(1, RelayEventKind::FinishLoad { url: "https://example.com/".into() }), t0)
            .unwrap();
        assert_eq!(ctl.poll(t0 + ms(600)), 1);
        collect(&mut ctl);

        let t1 = t0 + ms(1000);
        ctl.handle_event(&event(1, RelayEventKind::FinishLoad { url: "https://example.org/".into() }), t1)
            .unwrap();
        assert_eq!(ctl.poll(t1 + ms(600)), 1);
        collect(&mut ctl);

        assert_eq!(written, vec!["https://example.com/".to_string(), "https://example.org/".to_string()]);
    }

    #[test]
    fn closing_cancels_pending_history() {
        let (mut ctl, _home) = controller();
        let a = bound(&mut ctl, "https://a.test/", 1);
        let t0 = Instant::now();
        ctl.handle_event(&event(1, RelayEventKind::FinishLoad { url: "https://a.test/".into() }), t0)
            .unwrap();
        assert!(ctl.history_pending(&a));
        ctl.close_tab(&a).unwrap();
        ctl.drain_effects();
        assert_eq!(ctl.poll(t0 + ms(1000)), 0);
        assert!(ctl.drain_effects().is_empty());
    }

    #[test]
    fn incognito_and_internal_pages_are_never_recorded() {
        let (mut ctl, _home) = controller();
        let private = ctl.open_incognito().unwrap();
        ctl.on_surface_ready(&private, SurfaceId(4)).unwrap();
        let normal = bound(&mut ctl, "https://a.test/", 5);
        let t0 = Instant::now();

        ctl.handle_event(&event(4, RelayEventKind::FinishLoad { url: "https://secret.test/".into() }), t0)
            .unwrap();
        ctl.handle_event(&event(5, RelayEventKind::FinishLoad { url: "chrome://settings".into() }), t0)
            .unwrap();
        ctl.handle_event(&event(5, RelayEventKind::TitleUpdated { title: "Settings".into() }), t0)
            .unwrap();

        assert!(!ctl.history_pending(&private));
        assert!(!ctl.history_pending(&normal));
        ctl.drain_effects();
        assert_eq!(ctl.poll(t0 + ms(5000)), 0);
    }

    // =========================================================================
    // Title polling
    // =========================================================================

    #[test]
    fn in_page_navigation_polls_title_until_found() {
        let (mut ctl, _home) = controller();
        let a = bound(&mut ctl, "https://spa.test/", 1);
        let t0 = Instant::now();

        ctl.handle_event(&event(1, RelayEventKind::DidNavigateInPage { url: "https://spa.test/#/b".into() }), t0)
            .unwrap();
        assert!(ctl.title_poll_pending(&a));
        assert_eq!(ctl.poll(t0 + ms(199)), 0);
        assert_eq!(ctl.poll(t0 + ms(200)), 1);
        assert_eq!(
            ctl.drain_effects(),
            vec![Effect::QueryTitle { tab_id: a.clone(), surface_id: SurfaceId(1) }]
        );
        // outstanding query: nothing else fires
        assert_eq!(ctl.poll(t0 + ms(10_000)), 0);

        let t1 = t0 + ms(210);
        ctl.on_title_polled(&a, SurfaceId(1), Some(""), t1).unwrap();
        assert_eq!(ctl.next_deadline(), Some(t1 + ms(300)));
        assert_eq!(ctl.poll(t1 + ms(300)), 1);
        ctl.drain_effects();

        ctl.on_title_polled(&a, SurfaceId(1), Some("Page B"), t1 + ms(320)).unwrap();
        assert!(!ctl.title_poll_pending(&a));
        assert_eq!(ctl.tab(&a).unwrap().title, "Page B");
    }

    #[test]
    fn title_from_replaced_surface_is_dropped() {
        let (mut ctl, _home) = controller();
        let a = bound(&mut ctl, "https://spa.test/", 1);
        let t0 = Instant::now();
        ctl.handle_event(&event(1, RelayEventKind::DidNavigateInPage { url: "https://spa.test/#/x".into() }), t0)
            .unwrap();
        assert_eq!(ctl.poll(t0 + ms(200)), 1);
        ctl.drain_effects();

        ctl.on_surface_ready(&a, SurfaceId(2)).unwrap();
        assert!(!ctl.title_poll_pending(&a));
        ctl.drain_effects();

        assert_eq!(
            ctl.on_title_polled(&a, SurfaceId(1), Some("Old Surface"), t0 + ms(250)),
            Err(TabError::StaleEvent(SurfaceId(1)))
        );
        assert_eq!(ctl.tab(&a).unwrap().title, "New Tab");
        assert_eq!(ctl.next_deadline(), None);
    }

    #[test]
    fn title_poll_gives_up_after_schedule() {
        let (mut ctl, _home) = controller();
        let a = bound(&mut ctl, "https://spa.test/", 1);
        let mut now = Instant::now();
        ctl.handle_event(&event(1, RelayEventKind::UrlChanged { url: "https://spa.test/c".into() }), now)
            .unwrap();

        let mut queries = 0;
        while ctl.title_poll_pending(&a) {
            now += ms(300);
            queries += ctl.poll(now);
            ctl.on_title_polled(&a, SurfaceId(1), None, now).unwrap();
        }
        assert_eq!(queries, 4);
        assert_eq!(ctl.tab(&a).unwrap().title, "New Tab");
    }

    #[test]
    fn title_event_ends_polling() {
        let (mut ctl, _home) = controller();
        let a = bound(&mut ctl, "https://spa.test/", 1);
        let t0 = Instant::now();
        ctl.handle_event(&event(1, RelayEventKind::UrlChanged { url: "https://spa.test/d".into() }), t0)
            .unwrap();
        ctl.handle_event(&event(1, RelayEventKind::TitleChanged { title: "D".into() }), t0)
            .unwrap();
        assert!(!ctl.title_poll_pending(&a));
    }

    // =========================================================================
    // Toolbar, drops, ordering
    // =========================================================================

    #[test]
    fn toolbar_navigation_targets_active_surface() {
        let (mut ctl, _home) = controller();
        bound(&mut ctl, "https://a.test/", 1);
        ctl.toolbar_command(ToolbarCommand::Back).unwrap();
        ctl.toolbar_command(ToolbarCommand::Forward).unwrap();
        ctl.toolbar_command(ToolbarCommand::Reload).unwrap();
        ctl.toolbar_command(ToolbarCommand::LoadUrl("  ".into())).unwrap();
        ctl.toolbar_command(ToolbarCommand::LoadUrl("about:home".into())).unwrap();
        assert_eq!(
            ctl.drain_effects(),
            vec![
                Effect::GoBack { surface_id: SurfaceId(1) },
                Effect::GoForward { surface_id: SurfaceId(1) },
                Effect::Reload { surface_id: SurfaceId(1) },
                Effect::Navigate {
                    surface_id: SurfaceId(1),
                    url: "about:blank".into(),
                    visible: false,
                },
            ]
        );
        assert_eq!(ctl.active().unwrap().url, "about:home");
    }

    #[test]
    fn toolbar_can_open_incognito_tab() {
        let (mut ctl, _) = controller();
        ctl.toolbar_command(ToolbarCommand::NewIncognitoTab).unwrap();
        assert!(ctl.active().unwrap().incognito);
        assert_eq!(ctl.toolbar().title, "New Incognito Tab");
    }

    #[test]
    fn dropping_url_on_a_tab_retargets_it() {
        let (mut ctl, home) = controller();
        let a = bound(&mut ctl, "https://a.test/", 1);
        let got = ctl.drop_url("https://docs.rs/tokio", Some(&a)).unwrap();
        assert_eq!(got, a);
        let tab = ctl.tab(&a).unwrap();
        assert_eq!(tab.title, "docs.rs");
        assert_eq!(tab.favicon.as_deref(), Some("https://docs.rs/favicon.ico"));
        assert_eq!(ctl.toolbar().title, "docs.rs");
        assert!(matches!(
            ctl.drain_effects().as_slice(),
            [Effect::Navigate { surface_id: SurfaceId(1), visible: true, .. }]
        ));
        assert_eq!(ctl.order().len(), 2);
        assert_ne!(got, home);
    }

    #[test]
    fn dropping_url_on_empty_strip_space_opens_tab() {
        let (mut ctl, _) = controller();
        let id = ctl.drop_url("https://new.test/page", None).unwrap();
        assert_eq!(ctl.active_id(), Some(&id));
        assert_eq!(ctl.tab(&id).unwrap().title, "new.test");
        assert_eq!(ctl.drop_url(" ", None), Err(TabError::EmptyUrl));
        let ghost = TabId::from("ghost");
        assert_eq!(
            ctl.drop_url("https://x.test/", Some(&ghost)),
            Err(TabError::NotFound(ghost))
        );
    }

    #[test]
    fn reorder_keeps_tabs_and_active_selection() {
        let (mut ctl, home) = controller();
        let a = bound(&mut ctl, "https://a.test/", 1);
        ctl.reorder(&[a.clone(), home.clone()]).unwrap();
        assert_eq!(ctl.order(), &[a.clone(), home.clone()]);
        assert_eq!(ctl.active_id(), Some(&a));
        assert_eq!(ctl.reorder(&[a.clone()]), Err(TabError::InvalidOrder));
    }

    #[test]
    fn activate_unknown_tab_fails() {
        let (mut ctl, _) = controller();
        let ghost = TabId::from("nope");
        assert_eq!(ctl.activate(&ghost), Err(TabError::NotFound(ghost)));
    }

    #[test]
    fn toolbar_command_serde_shape() {
        let cmd: ToolbarCommand =
            serde_json::from_str(r#"{"kind":"load-url","url":"https://a.test/"}"#).unwrap();
        assert_eq!(cmd, ToolbarCommand::LoadUrl("https://a.test/".into()));
        let cmd: ToolbarCommand = serde_json::from_str(r#"{"kind":"back"}"#).unwrap();
        assert_eq!(cmd, ToolbarCommand::Back);
    }
}
