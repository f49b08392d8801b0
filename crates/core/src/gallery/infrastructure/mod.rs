pub mod directory_gallery_loader;
