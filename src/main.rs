use aco_tsp::utils::ToDisplayPath;
use aco_tsp::{AntSystem, ColonyProps, TourClosure};
use anyhow::Error;
use ndarray::Array2;
use prettytable::format::consts::FORMAT_BOX_CHARS;
use prettytable::{cell, row, table};
use std::{fs::File, io::Write};

fn main() -> Result<(), Error> {
    let distances: Vec<_> = [
        0, 12, 3, 23, 1, 5, 23, 56, 12, 11, //
        12, 0, 9, 18, 3, 41, 45, 5, 41, 27, //
        3, 9, 0, 89, 56, 21, 12, 48, 14, 29, //
        23, 18, 89, 0, 87, 46, 75, 17, 50, 42, //
        1, 3, 56, 87, 0, 55, 22, 86, 14, 33, //
        5, 41, 21, 46, 55, 0, 21, 76, 54, 81, //
        23, 45, 12, 75, 22, 21, 0, 11, 57, 48, //
        56, 5, 48, 17, 86, 76, 11, 0, 63, 24, //
        12, 41, 14, 50, 14, 54, 57, 63, 0, 9, //
        11, 27, 29, 42, 33, 81, 48, 24, 9, 0, //
    ]
    .iter()
    .map(|v| *v as f64)
    .collect();

    let distances = Array2::from_shape_vec((10, 10), distances)?;

    let iters = 100;

    let props = ColonyProps {
        ant_count: 10,
        alpha: 1.0,
        beta: 2.0,
        rho: 0.5,
        q: 1.0,
        initial_pheromone: 0.1,
        closure: TourClosure::Open,
        seed: None,
    };

    let closed = props.closure == TourClosure::Closed;
    let mut table = table! {
        ["Cantidad de hormigas", props.ant_count],
        ["Cantidad de iteraciones", iters],
        ["Ciudad inicial", "aleatoria"],
        ["𝛼 (alpha)", props.alpha],
        ["𝛽 (beta)", props.beta],
        ["𝜌 (rho)", props.rho],
        ["Q", props.q],
        ["Feromona inicial", props.initial_pheromone],
        ["Camino cerrado", closed]
    };
    table.set_format(*FORMAT_BOX_CHARS);

    let mut out = File::create("aco-tsp.out")?;

    writeln!(out, "Parámetros")?;
    writeln!(out, "{}\n", table)?;

    let mut ant_system = AntSystem::new(distances, props)?;
    let (path, cost) = ant_system.solve(iters, &mut out)?;

    println!(
        "Mejor camino global: {} con costo {}",
        path.to_display_path()?,
        cost
    );

    Ok(())
}
