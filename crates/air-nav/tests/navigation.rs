//! Full navigation cycles against the in-memory platform.

use air_config::Config;
use air_dom::{Dom, MemoryDom};
use air_form::SubmitOutcome;
use air_nav::mock::{MockPlatform, ScriptedFetcher, mock_host};
use air_nav::{App, Binding, ClickDecision, LightboxEvent, NavOutcome};
use air_storage::FixedClock;
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;

const INDEX: &str = r#"<html><head><title>Projeto Air</title></head><body>
<header><a href="index.html">Início</a><a href="cadastro.html">Cadastro</a></header>
<main>
  <h1>Início</h1>
  <div class="galeria-container"><img id="foto" src="img/horta.jpg" alt="Horta"></div>
  <section class="projeto"><a id="cta" class="botao" href="cadastro.html">Participar</a></section>
</main>
</body></html>"#;

const SOBRE: &str = r#"<html><head><title>Sobre</title></head><body>
<main><h1>Sobre</h1></main></body></html>"#;

const PROJETOS: &str = r#"<html><head><title>Projetos</title></head><body>
<main><h1>Projetos</h1></main></body></html>"#;

const CADASTRO: &str = r##"<html><head><title>Cadastro</title></head><body>
<main><h1>Cadastro</h1><form action="#">
  <input id="nome"><input id="email"><input id="contato"><input id="nascimento">
  <select id="uf"><option value="">--</option><option value="MG">MG</option></select>
  <select id="formaContribuicao"><option value="">--</option><option value="doador">D</option></select>
  <div id="opcaoVoluntario"><input type="checkbox" value="eventos"></div>
  <div id="opcaoDoador"><input type="radio" name="metodo" value="pix"></div>
</form></main></body></html>"##;

fn app(fetcher: ScriptedFetcher) -> App<MockPlatform> {
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());
    App::new(Config::default(), mock_host(INDEX, fetcher, clock)).unwrap()
}

fn dom(app: &App<MockPlatform>) -> &MemoryDom {
    &app.host().dom
}

fn heading(app: &App<MockPlatform>) -> String {
    let h1 = dom(app).find("main h1").unwrap();
    dom(app).text_content(&h1)
}

fn is_loading(app: &App<MockPlatform>) -> bool {
    let root = dom(app).document_element();
    dom(app).has_class(&root, "pa-loading")
}

#[test]
fn test_mount_binds_initial_page() {
    let app = app(ScriptedFetcher::new());

    let kinds: Vec<&str> = app.mount().iter().map(Binding::kind).collect();

    assert_eq!(kinds, vec!["lightbox", "navigate"]);
    assert_eq!(app.mount(), vec![]);
}

#[test]
fn test_latest_navigation_wins() {
    let fetcher = ScriptedFetcher::new()
        .with_page("sobre.html", SOBRE)
        .with_page("projetos.html", PROJETOS);
    fetcher.hold("sobre.html");
    let app = app(fetcher);

    let mut first = tokio_test::task::spawn(app.navigate("sobre.html", true));
    assert!(first.poll().is_pending());
    assert!(is_loading(&app));

    let second = tokio_test::block_on(app.navigate("projetos.html", true));
    assert!(matches!(second, NavOutcome::Swapped { .. }));
    assert!(is_loading(&app), "first cycle is still in flight");

    app.host().fetcher.release("sobre.html");
    let outcome = match first.poll() {
        std::task::Poll::Ready(outcome) => outcome,
        std::task::Poll::Pending => panic!("first cycle should finish"),
    };
    drop(first);

    assert_eq!(outcome, NavOutcome::Superseded);
    assert_eq!(heading(&app), "Projetos");
    assert_eq!(dom(&app).title(), "Projetos");
    assert!(!is_loading(&app));
    assert_eq!(app.host().history.pushes().len(), 1);
    assert_eq!(app.host().notifier.alerts(), Vec::<String>::new());
}

#[test]
fn test_superseded_failure_does_not_alert() {
    let fetcher = ScriptedFetcher::new().with_page("projetos.html", PROJETOS);
    fetcher.hold("quebrada.html");
    let app = app(fetcher);

    let mut first = tokio_test::task::spawn(app.navigate("quebrada.html", true));
    assert!(first.poll().is_pending());
    tokio_test::block_on(app.navigate("projetos.html", true));
    app.host().fetcher.release("quebrada.html");

    assert!(matches!(
        first.poll(),
        std::task::Poll::Ready(NavOutcome::Superseded)
    ));
    assert_eq!(app.host().notifier.alerts(), Vec::<String>::new());
}

#[test]
fn test_cta_navigation_then_submit() {
    let app = app(ScriptedFetcher::new().with_page("cadastro.html", CADASTRO));
    app.mount();

    let cta = dom(&app).find("#cta").unwrap();
    let ClickDecision::Navigate(url) = app.on_cta_click(&cta) else {
        panic!("call-to-action should navigate");
    };
    let NavOutcome::Swapped { bindings } = tokio_test::block_on(app.navigate(&url, true)) else {
        panic!("expected swap");
    };
    let Some(Binding::Submit { form }) = bindings.into_iter().next() else {
        panic!("expected form binding");
    };

    let d = dom(&app);
    d.set_value(d.find("#nome").unwrap(), "João Pereira");
    d.set_value(d.find("#email").unwrap(), "joao@example.com");
    d.set_value(d.find("#contato").unwrap(), "31 99876-5432");
    d.set_value(d.find("#nascimento").unwrap(), "1990-01-15");
    d.set_value(d.find("#uf").unwrap(), "MG");
    d.set_value(d.find("#formaContribuicao").unwrap(), "doador");
    d.set_checked(d.find(r#"[value="pix"]"#).unwrap(), true);

    let outcome = app.submit(&form).unwrap();

    assert!(matches!(outcome, SubmitOutcome::Saved(_)));
    let entries = app.submission_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["nome"], "João Pereira");
    assert_eq!(entries[0]["forma"], "doador");
    assert_eq!(entries[0]["metodo"], "pix");
    assert_eq!(entries[0]["createdAt"], "2024-06-01T12:00:00.000Z");
}

#[test]
fn test_lightbox_from_binding() {
    let app = app(ScriptedFetcher::new());
    let image = app
        .mount()
        .into_iter()
        .find_map(|binding| match binding {
            Binding::Lightbox { image } => Some(image),
            _ => None,
        })
        .unwrap();

    let LightboxEvent::Opened { overlay } = app.open_lightbox(&image) else {
        panic!("expected lightbox");
    };
    assert!(dom(&app).is_connected(&overlay));
    assert_eq!(app.lightbox_key("Escape"), LightboxEvent::Closed);
    assert!(!dom(&app).is_connected(&overlay));
}

#[test]
fn test_pending_enter_removal_is_cancelled_by_next_swap() {
    let fetcher = ScriptedFetcher::new()
        .with_page("sobre.html", SOBRE)
        .with_page("projetos.html", PROJETOS);
    let app = app(fetcher);

    tokio_test::block_on(app.navigate("sobre.html", true));
    assert_eq!(app.scheduler().pending(), 1);
    tokio_test::block_on(app.navigate("projetos.html", true));
    assert_eq!(app.scheduler().pending(), 1);

    app.host().timer.run_all();
    let main = dom(&app).find("main").unwrap();
    assert!(!dom(&app).has_class(&main, "pa-enter"));
}
