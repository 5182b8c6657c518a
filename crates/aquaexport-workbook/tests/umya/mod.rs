
mod durability;
mod idempotence;
mod progress;
mod projection;
