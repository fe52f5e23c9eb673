#![cfg_attr(target_os = "solana", no_std)]

pub mod state;
pub mod instructions;
pub mod pda;

// Always expose entrypoint for testing, but only register as entrypoint when feature enabled
pub mod entrypoint;

// Panic handler for no_std builds (only for Solana BPF)
#[cfg(all(target_os = "solana", not(test)))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {}
}

pub use state::*;
pub use instructions::StakingInstruction;

pinocchio_pubkey::declare_id!("Stake11111111111111111111111111111111111111");
