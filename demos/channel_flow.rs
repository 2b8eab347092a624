use clap::Parser;
use latblock::analysis::*;
use latblock::boundary::*;
use latblock::config::*;
use latblock::error::{LatticeError, Result};
use latblock::field::*;
use latblock::lattice::*;
use latblock::tracer::*;
use latblock::util::*;
use std::path::PathBuf;
use std::sync::Arc;

/// Poiseuille-like flow in a 2D channel: velocity inlet on the left,
/// pressure outlet on the right, bounce-back walls on top and bottom.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Optional JSON run configuration, command line values win.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Channel length.
    #[arg(long, default_value = "120")]
    nx: i32,

    /// Channel height, walls included.
    #[arg(long, default_value = "30")]
    ny: i32,

    /// Peak inlet velocity in lattice units.
    #[arg(short, long, default_value = "0.05")]
    u_max: f64,

    /// BGK relaxation frequency.
    #[arg(short, long, default_value = "1.6")]
    omega: f64,

    #[arg(short, long, default_value = "20000")]
    max_steps: usize,

    /// Relative deviation of the average energy at which the run stops.
    #[arg(short, long, default_value = "1e-5")]
    epsilon: f64,

    /// How often to log progress.
    #[arg(long, default_value = "500")]
    report_every: usize,

    /// Density perturbation of the initial state.
    #[arg(long, default_value = "constant")]
    initial_condition: ClapInitialCondition,

    #[arg(long, default_value = "0")]
    seed: u64,

    /// The number of threads to use, zero lets rayon pick.
    #[arg(short, long)]
    threads: Option<usize>,

    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn run_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_json_file(path)?,
            None => RunConfig::default(),
        };
        if let Some(threads) = self.threads {
            config.num_threads = threads;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        config.validate()?;
        Ok(config)
    }

    fn initial_condition(&self) -> InitialCondition {
        match self.initial_condition {
            ClapInitialCondition::Constant => InitialCondition::Constant,
            ClapInitialCondition::Perturbation => InitialCondition::Perturbation {
                amplitude: 1.0,
                seed: self.seed,
            },
            ClapInitialCondition::Impulse => {
                InitialCondition::Impulse { variance: 8.0 }
            }
        }
    }
}

fn poiseuille(y: i32, ny: i32, u_max: f64) -> f64 {
    let h = (ny - 2) as f64;
    let y = (y - 1) as f64 + 0.5;
    4.0 * u_max * y * (h - y) / (h * h)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.run_config()?;
    let level: tracing::Level = config.log_level.parse().map_err(|_| {
        LatticeError::Config(format!("unknown log level {}", config.log_level))
    })?;
    tracing_subscriber::fmt().with_max_level(level).init();

    if config.num_threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .thread_name(|i| format!("rayon_thread_{}", i))
            .build_global()
            .map_err(|e| LatticeError::Logic(e.to_string()).report())?;
    }

    let mut context = RunContext::new(config);
    let (nx, ny) = (args.nx, args.ny);
    tracing::info!("channel {}x{}, omega {}, u_max {}", nx, ny, args.omega, args.u_max);

    let bulk: Arc<dyn Dynamics<2, 9>> = Arc::new(BgkDynamics::new(&D2Q9, args.omega));
    let mut lattice = BlockLattice::<2, 9>::new(vector![nx, ny], bulk)
        .with_chunk_size(context.config.chunk_size);
    let all = lattice.bounding_box();

    let mut rho = ScalarField::new(vector![nx, ny], 0.0);
    generate_initial_condition(
        &mut rho,
        args.initial_condition(),
        context.config.chunk_size,
    );
    for c in all.coord_iter() {
        lattice.initialize_at_equilibrium(
            &AABB::from_mm(c, c),
            1.0 + 0.01 * rho.get(&c),
            &Tensor::<2>::zeros(),
        );
    }

    let walls = [
        AABB::new(matrix![0, nx - 1; 0, 0]),
        AABB::new(matrix![0, nx - 1; ny - 1, ny - 1]),
    ];
    for wall in &walls {
        lattice.define_dynamics(wall, Arc::new(BounceBack::new(&D2Q9)));
    }

    let setter = BoundaryConditionSetter::new(&D2Q9, args.omega);
    let inlet = AABB::new(matrix![0, 0; 1, ny - 2]);
    let outlet = AABB::new(matrix![nx - 1, nx - 1; 1, ny - 2]);
    setter.set_velocity_condition_on_block_boundaries(
        &mut lattice,
        &inlet,
        BoundaryKind::Dirichlet,
    );
    setter.set_pressure_condition_on_block_boundaries(
        &mut lattice,
        &outlet,
        BoundaryKind::Dirichlet,
    );
    for y in 1..ny - 1 {
        let c = vector![0, y];
        setter.set_boundary_velocity(
            &mut lattice,
            &AABB::from_mm(c, c),
            &Tensor::<2>::new(poiseuille(y, ny, args.u_max), 0.0),
        );
    }
    setter.set_boundary_density(&mut lattice, &outlet, 1.0);

    let mut tracer = ValueTracer::new(args.u_max, (ny - 2) as f64, args.epsilon);
    let fluid = AABB::new(matrix![0, nx - 1; 1, ny - 2]);
    context.timers.start("run");
    let mut state = Convergence::Running;
    while lattice.steps() < args.max_steps {
        lattice.collide_and_stream();
        let energy = compute_average_energy(lattice.cells(), &fluid);
        tracer.take_value(energy);
        if lattice.steps() % args.report_every == 0 {
            tracing::info!("step {}: average energy {:.6e}", lattice.steps(), energy);
        }
        state = tracer.convergence();
        if state != Convergence::Running {
            break;
        }
    }
    let elapsed = context.timers.stop("run");

    let density = compute_average_density(lattice.cells(), &fluid);
    let energy = compute_average_energy(lattice.cells(), &fluid);
    tracing::info!(
        "{:?} after {} steps in {:.2?}: average density {:.6}, average energy {:.6e}",
        state,
        lattice.steps(),
        elapsed,
        density,
        energy
    );
    if state == Convergence::Diverged {
        tracing::warn!("simulation diverged, try a smaller u_max or omega");
    }
    Ok(())
}
