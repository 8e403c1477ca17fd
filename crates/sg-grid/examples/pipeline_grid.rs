use sg_grid::*;
use sg_types::*;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("searchgrid pipeline example");

    // Feature selection with its own grid
    let select = set_grid(
        Estimator::new("SelectKBest").into_node(),
        conjunction! { "k" => [5, 10, 20] },
    );

    // Two alternative classifiers, one with its own grid
    let svc = set_grid(
        Estimator::new("SVC").with_param("kernel", "rbf").into_node(),
        conjunction! { "C" => [0.1, 1.0, 10.0] },
    );
    let lr = Estimator::new("LogisticRegression").into_node();

    let pipe = make_pipeline(
        vec![
            Slot::from(vec![Value::from(&select), Value::None]),
            Slot::from(vec![Value::from(&svc), Value::from(&lr)]),
        ],
        ParamMap::new(),
    )?;
    println!("Pipeline: {pipe}");

    let grid = build_param_grid(&pipe)?;
    println!("Expanded grid:\n{}", serde_json::to_string_pretty(&grid)?);

    let options = SearchOptions::from_json(r#"{"cv": 3, "scoring": "accuracy"}"#)?;
    let mut search = make_grid_search(&pipe, options)?;
    println!("{} candidate point(s)", search.remaining());

    for point in search.suggest(5) {
        let rendered: Vec<String> = point.iter().map(|(k, v)| format!("{k}={v}")).collect();
        println!("  {}", rendered.join(", "));
    }

    Ok(())
}
