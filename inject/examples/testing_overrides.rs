use fibre_inject::{
  create_manager, depends, overrides, Arguments, Manager, Parameter, Provider, Result, Signature,
};

struct Clock {
  now: u64,
}

fn system_clock() -> Clock {
  Clock { now: 1_700_000_000 }
}

fn main() -> Result<()> {
  tracing_subscriber::fmt().init();

  let manager: Manager = create_manager();
  let clock = Provider::new(system_clock);

  // Uncached: every call asks the provider again.
  let timestamp = manager.autowire(
    Signature::new()
      .param(Parameter::new::<Clock>("clock").annotated(depends(&clock).cache(false))),
    |args| Ok(args.get::<Clock>("clock")?.now),
  );

  println!("real clock:   {}", timestamp.call(Arguments::new())?);

  let frozen = Provider::new(|| Clock { now: 0 });
  {
    let scope = manager.override_scope(overrides! { clock => frozen });
    println!("frozen clock: {}", scope.call(&timestamp, Arguments::new())?);

    // Nested scopes restore in reverse order.
    let later = Provider::new(|| Clock { now: 60 });
    manager.with_overrides(overrides! { clock => later }, || {
      println!("nested clock: {:?}", timestamp.call(Arguments::new()));
    });
    println!("frozen again: {}", timestamp.call(Arguments::new())?);
  }

  println!("real again:   {}", timestamp.call(Arguments::new())?);
  Ok(())
}
