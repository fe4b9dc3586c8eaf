mod coercion;
mod hooks;
mod round_trip;
mod wire;
