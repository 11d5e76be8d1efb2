use bpnet::{train_loop, Matrix, NetworkSpec, TrainConfig};

fn sample(a: f64, b: f64, target: f64) -> bpnet::Result<(Matrix, Matrix)> {
    Ok((Matrix::column_vector(&[a, b])?, Matrix::column_vector(&[target])?))
}

fn main() -> bpnet::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let samples = vec![
        sample(0.0, 0.0, 0.0)?,
        sample(0.0, 1.0, 1.0)?,
        sample(1.0, 0.0, 1.0)?,
        sample(1.0, 1.0, 0.0)?,
    ];

    let mut network = NetworkSpec::new(2, 3, 1)
        .with_learn_rate(0.5)
        .build()?;

    let loss = train_loop(&mut network, &samples, &TrainConfig::new(10000))?;
    println!("final loss = {loss:.6}");

    for (input, target) in &samples {
        let output = network.forward(input)?;
        println!(
            "Input: {:?} -> Output: {:.4} (target {})",
            input.as_slice(),
            output[(0, 0)],
            target[(0, 0)]
        );
    }
    Ok(())
}
