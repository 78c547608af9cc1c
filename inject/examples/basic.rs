use fibre_inject::{
  depends, execute, Arguments, AutoWired, Dependency, Parameter, Provider, Result, Signature,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Greeting {
  text: String,
}

#[derive(Debug, Default)]
struct Audience {
  name: String,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::from_default_env().add_directive("fibre_inject=trace".parse().unwrap()),
    )
    .init();

  // Providers are plain zero-argument factories.
  let greeting = Provider::new(|| Greeting {
    text: "Hello".to_string(),
  });

  // `constructible` lets the declared type build itself through `Default`.
  let greet = AutoWired::new(
    Signature::new()
      .param(Parameter::new::<Greeting>("greeting").annotated(depends(&greeting)))
      .param(
        Parameter::constructible::<Audience>("audience")
          .annotated(Dependency::<Audience>::declared()),
      ),
    |args| {
      let greeting = args.get::<Greeting>("greeting")?;
      let audience = args.get::<Audience>("audience")?;
      let name: &str = if audience.name.is_empty() { "world" } else { &audience.name };
      Ok(format!("{}, {}!", greeting.text, name))
    },
  );

  println!("{}", execute(|args| greet.call(args), Arguments::new())?);

  // Explicit arguments always win over injected ones.
  let explicit = Arguments::new().kwarg(
    "audience",
    Audience {
      name: "fibre".to_string(),
    },
  );
  println!("{}", execute(|args| greet.call(args), explicit)?);

  Ok(())
}
