/*!
Monte Carlo estimation of the probability that a double-spend attacker wins
its race against the honest chain before a deadline.

A scenario fixes the attacker's share of the hash power, the mean block
interval, the confirmation depth and the attacker's time budget. A
[`Simulation`](simulation::Simulation) plays a scenario out many times under
one [`Race`](race::Race) policy and records the running win rate after every
trial; a [`ScenarioSweep`](sweep::ScenarioSweep) does so over a grid of
powers and time budgets.

```
use double_spend_sim::prelude::*;

let sim = Simulation::builder()
    .race(ContinuousRace::new())
    .trials(1_000)
    .seed(42)
    .build()
    .unwrap();

let result = sim.run_scenario(&Parameters::new(0.3, 6.0 * 3600.0)).unwrap();
assert_eq!(result.trials(), 1_000);
assert!(result.win_rate() < 0.5);
```
*/

pub mod params;
pub mod prelude;
pub mod race;
pub mod results;
pub mod rng;
pub mod sampler;
pub mod simulation;
pub mod sink;
pub mod sweep;
